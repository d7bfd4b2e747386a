use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{ProviderFuture, TextTranslator};

const DEFAULT_BASE_URL: &str = "https://translation.googleapis.com/language/translate/v2";

/// Google Cloud Translation (v2). Translates only; no annotations.
#[derive(Debug, Clone)]
pub struct GoogleTranslate {
    client: reqwest::Client,
    key: String,
    base_url: String,
}

impl GoogleTranslate {
    pub fn new(client: reqwest::Client, key: impl Into<String>) -> Self {
        Self {
            client,
            key: key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        if !base_url.trim().is_empty() {
            self.base_url = base_url.trim_end_matches('/').to_string();
        }
        self
    }

    async fn request(&self, text: &str, target_language: &str) -> Result<Option<String>> {
        let body = json!({
            "q": text,
            "target": target_language,
            "format": "text",
        });

        debug!(target_language, chars = text.chars().count(), "sending translate request");

        let response = self
            .client
            .post(&self.base_url)
            .query(&[("key", self.key.as_str())])
            .json(&body)
            .send()
            .await
            .with_context(|| "translate request failed")?;

        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| "failed to read translate response")?;
        if !status.is_success() {
            return Err(anyhow!(
                "Google Translate API error ({}): {}",
                status,
                extract_google_error(&text).unwrap_or(text)
            ));
        }
        extract_translated_text(&text)
    }
}

impl TextTranslator for GoogleTranslate {
    fn translate<'a>(
        &'a self,
        text: &'a str,
        target_language: &'a str,
    ) -> ProviderFuture<'a, Option<String>> {
        Box::pin(self.request(text, target_language))
    }
}

pub(crate) fn extract_translated_text(body: &str) -> Result<Option<String>> {
    let payload: TranslateResponse = serde_json::from_str(body)
        .with_context(|| "failed to parse Google Translate response JSON")?;
    let text = payload
        .data
        .and_then(|data| data.translations.into_iter().next())
        .and_then(|translation| translation.translated_text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());
    Ok(text)
}

fn extract_google_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<GoogleError>,
    }

    #[derive(Deserialize)]
    struct GoogleError {
        message: Option<String>,
        status: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let error = parsed.error?;
    match (error.message, error.status) {
        (Some(message), Some(status)) => Some(format!("{} | status: {}", message, status)),
        (Some(message), None) => Some(message),
        (None, Some(status)) => Some(format!("status: {}", status)),
        (None, None) => None,
    }
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: Option<TranslateData>,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: Option<String>,
}
