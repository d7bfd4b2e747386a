use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use crate::providers::{self, AudioPayload, SpeechToText, TextTranslator};
use crate::settings::{Credentials, Settings};

/// Runs the transcription and translation stages against the configured
/// providers. Cheap to clone; holds no per-request state.
#[derive(Clone)]
pub struct Translator {
    speech: Arc<dyn SpeechToText>,
    text: Arc<dyn TextTranslator>,
    separator: String,
}

impl Translator {
    pub fn new(
        speech: Arc<dyn SpeechToText>,
        text: Arc<dyn TextTranslator>,
        separator: impl Into<String>,
    ) -> Self {
        Self {
            speech,
            text,
            separator: separator.into(),
        }
    }

    pub fn from_settings(settings: &Settings, credentials: &Credentials) -> Result<Self> {
        let client = providers::build_http_client(settings)?;
        let speech = providers::build_speech_to_text(client.clone(), settings, credentials);
        let text = providers::build_text_translator(client, settings, credentials)?;
        Ok(Self::new(speech, text, settings.separator.clone()))
    }

    pub async fn transcribe(&self, audio: AudioPayload) -> Result<String> {
        let transcript = self.speech.transcribe(audio).await?;
        if transcript.is_empty() {
            info!("no speech detected; continuing with an empty transcript");
        } else {
            info!(chars = transcript.chars().count(), "transcription completed");
        }
        Ok(transcript)
    }

    /// Returns the transcript followed by the separator and the provider text,
    /// or an empty string when the provider produced nothing.
    pub async fn translate(&self, transcript: &str, target_language: &str) -> Result<String> {
        match self.text.translate(transcript, target_language).await? {
            Some(generated) => {
                info!(
                    chars = generated.chars().count(),
                    target_language, "translation completed"
                );
                Ok(compose_output(transcript, &self.separator, &generated))
            }
            None => {
                warn!(target_language, "translation provider returned no text");
                Ok(String::new())
            }
        }
    }
}

pub fn compose_output(transcript: &str, separator: &str, generated: &str) -> String {
    let mut output = String::with_capacity(transcript.len() + separator.len() + generated.len());
    output.push_str(transcript);
    output.push_str(separator);
    output.push_str(generated);
    output
}
