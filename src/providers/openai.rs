use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{DEFAULT_OPENAI_BASE_URL, ProviderFuture, TextTranslator};
use crate::translations;

pub(crate) const DEFAULT_MODEL: &str = "gpt-3.5-turbo-instruct";
pub(crate) const DEFAULT_MAX_TOKENS: u32 = 500;

// greedy decoding
const TEMPERATURE: f32 = 0.0;

/// OpenAI text completion endpoint, prompted to translate and annotate.
#[derive(Debug, Clone)]
pub struct OpenAICompletions {
    client: reqwest::Client,
    key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl OpenAICompletions {
    pub fn new(client: reqwest::Client, key: impl Into<String>) -> Self {
        Self {
            client,
            key: key.into(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        if !base_url.trim().is_empty() {
            self.base_url = base_url.trim_end_matches('/').to_string();
        }
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        if !model.trim().is_empty() {
            self.model = model;
        }
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        if max_tokens > 0 {
            self.max_tokens = max_tokens;
        }
        self
    }

    async fn complete(&self, text: &str, target_language: &str) -> Result<Option<String>> {
        let url = format!("{}/completions", self.base_url);
        let prompt = translations::render_instruction(text, target_language)?;
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "temperature": TEMPERATURE,
            "max_tokens": self.max_tokens,
        });

        debug!(
            model = %self.model,
            target_language,
            prompt_chars = prompt.chars().count(),
            "sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.key)
            .json(&body)
            .send()
            .await
            .with_context(|| "completion request failed")?;

        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| "failed to read completion response")?;
        if !status.is_success() {
            return Err(anyhow!(
                "OpenAI API error ({}): {}",
                status,
                extract_openai_error(&text).unwrap_or(text)
            ));
        }
        extract_completion_text(&text)
    }
}

impl TextTranslator for OpenAICompletions {
    fn translate<'a>(
        &'a self,
        text: &'a str,
        target_language: &'a str,
    ) -> ProviderFuture<'a, Option<String>> {
        Box::pin(self.complete(text, target_language))
    }
}

pub(crate) fn extract_completion_text(body: &str) -> Result<Option<String>> {
    let payload: CompletionResponse =
        serde_json::from_str(body).with_context(|| "failed to parse OpenAI response JSON")?;
    let text = payload
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());
    Ok(text)
}

pub(crate) fn extract_openai_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<OpenAIError>,
    }

    #[derive(Deserialize)]
    struct OpenAIError {
        message: Option<String>,
        #[serde(rename = "type")]
        kind: Option<String>,
        code: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let error = parsed.error?;
    Some(format_error_parts(error.message, error.kind, error.code))
}

fn format_error_parts(
    message: Option<String>,
    kind: Option<String>,
    code: Option<String>,
) -> String {
    let mut parts = Vec::new();
    if let Some(message) = message {
        if !message.trim().is_empty() {
            parts.push(message);
        }
    }
    if let Some(kind) = kind {
        if !kind.trim().is_empty() {
            parts.push(format!("type: {}", kind));
        }
    }
    if let Some(code) = code {
        if !code.trim().is_empty() {
            parts.push(format!("code: {}", code));
        }
    }
    if parts.is_empty() {
        "unknown error".to_string()
    } else {
        parts.join(" | ")
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: Option<String>,
}
