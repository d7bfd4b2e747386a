use anyhow::{anyhow, Context, Result};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;

use super::openai::extract_openai_error;
use super::{AudioPayload, DEFAULT_OPENAI_BASE_URL, ProviderFuture, SpeechToText};

pub(crate) const DEFAULT_MODEL: &str = "whisper-1";
const RESPONSE_FORMAT: &str = "text";

/// OpenAI audio transcription endpoint.
#[derive(Debug, Clone)]
pub struct Whisper {
    client: reqwest::Client,
    key: String,
    base_url: String,
    model: String,
}

impl Whisper {
    pub fn new(client: reqwest::Client, key: impl Into<String>) -> Self {
        Self {
            client,
            key: key.into(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
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

    async fn request(&self, audio: AudioPayload) -> Result<String> {
        let url = format!("{}/audio/transcriptions", self.base_url);
        let byte_len = audio.bytes.len();

        let mut part = Part::bytes(audio.bytes).file_name(audio.filename.clone());
        if let Some(content_type) = audio.content_type.as_deref() {
            part = part
                .mime_str(content_type)
                .with_context(|| format!("invalid audio content type: {}", content_type))?;
        }
        let form = Form::new()
            .text("model", self.model.clone())
            .part("file", part)
            .text("response_format", RESPONSE_FORMAT);

        debug!(
            model = %self.model,
            filename = %audio.filename,
            bytes = byte_len,
            response_format = RESPONSE_FORMAT,
            "sending audio to transcription provider"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.key)
            .multipart(form)
            .send()
            .await
            .with_context(|| "transcription request failed")?;

        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| "failed to read transcription response")?;
        if !status.is_success() {
            return Err(anyhow!(
                "transcription API error ({}): {}",
                status,
                extract_openai_error(&text).unwrap_or(text)
            ));
        }
        Ok(parse_transcription(&text))
    }
}

impl SpeechToText for Whisper {
    fn transcribe(&self, audio: AudioPayload) -> ProviderFuture<'_, String> {
        Box::pin(self.request(audio))
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Reads the raw `text` body. Compatible gateways that ignore the format hint
/// answer with `{"text": ...}`, which is unwrapped too.
pub(crate) fn parse_transcription(body: &str) -> String {
    match serde_json::from_str::<TranscriptionResponse>(body) {
        Ok(payload) => payload.text.trim().to_string(),
        Err(_) => body.trim().to_string(),
    }
}
