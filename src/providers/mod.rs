use anyhow::{anyhow, Context, Result};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::settings::{Credentials, Settings};

mod google;
mod openai;
mod whisper;

pub use google::GoogleTranslate;
pub use openai::OpenAICompletions;
pub use whisper::Whisper;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Backend serving the translation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAI,
    Google,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Google => "google",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAI),
            "google" | "google-translate" => Ok(ProviderKind::Google),
            other => Err(anyhow!(
                "unknown translation provider '{}' (expected openai or google)",
                other
            )),
        }
    }
}

/// Audio handed to the speech-to-text provider.
#[derive(Debug, Clone)]
pub struct AudioPayload {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: Option<String>,
}

pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

pub trait SpeechToText: Send + Sync {
    /// Returns the recognized text. An empty string means no speech was found.
    fn transcribe(&self, audio: AudioPayload) -> ProviderFuture<'_, String>;
}

pub trait TextTranslator: Send + Sync {
    /// Returns `None` when the provider answered without any text.
    fn translate<'a>(
        &'a self,
        text: &'a str,
        target_language: &'a str,
    ) -> ProviderFuture<'a, Option<String>>;
}

/// Shared outbound client. Built once per process.
pub fn build_http_client(settings: &Settings) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().connect_timeout(CONNECT_TIMEOUT);
    if settings.provider_timeout_secs > 0 {
        builder = builder.timeout(Duration::from_secs(settings.provider_timeout_secs));
    }
    builder
        .build()
        .with_context(|| "failed to build provider HTTP client")
}

pub fn build_speech_to_text(
    client: reqwest::Client,
    settings: &Settings,
    credentials: &Credentials,
) -> Arc<dyn SpeechToText> {
    Arc::new(
        Whisper::new(client, credentials.openai_api_key.clone())
            .with_base_url(openai_base_url(settings))
            .with_model(settings.transcription_model.clone()),
    )
}

pub fn build_text_translator(
    client: reqwest::Client,
    settings: &Settings,
    credentials: &Credentials,
) -> Result<Arc<dyn TextTranslator>> {
    match settings.translation_provider {
        ProviderKind::OpenAI => Ok(Arc::new(
            OpenAICompletions::new(client, credentials.openai_api_key.clone())
                .with_base_url(openai_base_url(settings))
                .with_model(settings.completion_model.clone())
                .with_max_tokens(settings.max_tokens),
        )),
        ProviderKind::Google => {
            let key = credentials
                .google_translate_api_key
                .clone()
                .ok_or_else(|| anyhow!("API key not found for provider 'google'"))?;
            let mut provider = GoogleTranslate::new(client, key);
            if let Some(url) = settings.google_base_url.as_deref() {
                provider = provider.with_base_url(url);
            }
            Ok(Arc::new(provider))
        }
    }
}

fn openai_base_url(settings: &Settings) -> String {
    get_env("OPENAI_BASE_URL")
        .or_else(|| settings.openai_base_url.clone())
        .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
}

fn get_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}
