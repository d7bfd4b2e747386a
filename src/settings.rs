use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::providers::ProviderKind;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const GOOGLE_TRANSLATE_API_KEY_ENV: &str = "GOOGLE_TRANSLATE_API_KEY";

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_addr: String,
    pub route_path: String,
    pub max_upload_bytes: usize,
    pub server_tmp_dir: Option<String>,
    pub log_level: String,
    pub transcription_model: String,
    pub translation_provider: ProviderKind,
    pub completion_model: String,
    pub max_tokens: u32,
    pub separator: String,
    pub provider_timeout_secs: u64,
    pub openai_base_url: Option<String>,
    pub google_base_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:3000".to_string(),
            route_path: "/api/transcribe-translate".to_string(),
            max_upload_bytes: 25 * 1024 * 1024,
            server_tmp_dir: None,
            log_level: "info".to_string(),
            transcription_model: "whisper-1".to_string(),
            translation_provider: ProviderKind::OpenAI,
            completion_model: "gpt-3.5-turbo-instruct".to_string(),
            max_tokens: 500,
            separator: "\n\n".to_string(),
            provider_timeout_secs: 120,
            openai_base_url: None,
            google_base_url: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    server: Option<ServerSettings>,
    logging: Option<LoggingSettings>,
    transcription: Option<TranscriptionSettings>,
    translation: Option<TranslationSettings>,
    providers: Option<ProviderSettings>,
    openai: Option<EndpointSettings>,
    google: Option<EndpointSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    addr: Option<String>,
    route: Option<String>,
    max_upload_mb: Option<usize>,
    tmp_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingSettings {
    level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TranscriptionSettings {
    model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TranslationSettings {
    provider: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    separator: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderSettings {
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct EndpointSettings {
    base_url: Option<String>,
}

/// Loads the embedded defaults, then `settings.toml` and `settings.local.toml`
/// from the working directory, then `extra_path` when given. Later files win.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    let defaults: SettingsFile =
        toml::from_str(DEFAULT_SETTINGS_TOML).with_context(|| "failed to parse default settings")?;
    settings.merge(defaults)?;

    let mut ordered_paths = vec![
        PathBuf::from("settings.toml"),
        PathBuf::from("settings.local.toml"),
    ];

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            settings.merge_str(&content).with_context(|| {
                format!("failed to parse settings: {}", path.display())
            })?;
        }
    }

    Ok(settings)
}

impl Settings {
    pub fn merge_str(&mut self, content: &str) -> Result<()> {
        let parsed: SettingsFile = toml::from_str(content)?;
        self.merge(parsed)
    }

    fn merge(&mut self, incoming: SettingsFile) -> Result<()> {
        if let Some(server) = incoming.server {
            if let Some(addr) = non_empty(server.addr) {
                self.server_addr = addr;
            }
            if let Some(route) = non_empty(server.route) {
                if !route.starts_with('/') {
                    return Err(anyhow!("server.route must start with '/': {}", route));
                }
                self.route_path = route;
            }
            if let Some(limit) = server.max_upload_mb {
                if limit > 0 {
                    self.max_upload_bytes = limit.saturating_mul(1024 * 1024);
                }
            }
            if let Some(dir) = non_empty(server.tmp_dir) {
                self.server_tmp_dir = Some(dir);
            }
        }
        if let Some(level) = incoming.logging.and_then(|logging| non_empty(logging.level)) {
            self.log_level = level;
        }
        if let Some(transcription) = incoming.transcription {
            if let Some(model) = non_empty(transcription.model) {
                self.transcription_model = model;
            }
        }
        if let Some(translation) = incoming.translation {
            if let Some(provider) = non_empty(translation.provider) {
                self.translation_provider = ProviderKind::from_name(&provider)?;
            }
            if let Some(model) = non_empty(translation.model) {
                self.completion_model = model;
            }
            if let Some(max_tokens) = translation.max_tokens {
                if max_tokens > 0 {
                    self.max_tokens = max_tokens;
                }
            }
            // an empty separator is allowed
            if let Some(separator) = translation.separator {
                self.separator = separator;
            }
        }
        if let Some(timeout) = incoming.providers.and_then(|providers| providers.timeout_secs) {
            self.provider_timeout_secs = timeout;
        }
        if let Some(url) = incoming.openai.and_then(|openai| non_empty(openai.base_url)) {
            self.openai_base_url = Some(url);
        }
        if let Some(url) = incoming.google.and_then(|google| non_empty(google.base_url)) {
            self.google_base_url = Some(url);
        }
        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// Provider credentials, read once at startup.
#[derive(Clone)]
pub struct Credentials {
    pub openai_api_key: String,
    pub google_translate_api_key: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("openai_api_key", &"<redacted>")
            .field(
                "google_translate_api_key",
                &self.google_translate_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl Credentials {
    pub fn from_env(settings: &Settings) -> Result<Self> {
        Self::from_lookup(settings, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(settings: &Settings, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        // transcription always goes through OpenAI
        let openai_api_key = get(OPENAI_API_KEY_ENV)
            .ok_or_else(|| anyhow!("{} is not set", OPENAI_API_KEY_ENV))?;

        let google_translate_api_key = get(GOOGLE_TRANSLATE_API_KEY_ENV);
        if settings.translation_provider == ProviderKind::Google
            && google_translate_api_key.is_none()
        {
            return Err(anyhow!(
                "{} is not set (required by translation provider '{}')",
                GOOGLE_TRANSLATE_API_KEY_ENV,
                settings.translation_provider.as_str()
            ));
        }

        Ok(Self {
            openai_api_key,
            google_translate_api_key,
        })
    }
}
