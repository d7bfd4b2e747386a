pub mod logging;
pub mod providers;
pub mod server;
pub mod settings;
pub mod translations;
mod translator;

pub use providers::{
    AudioPayload, GoogleTranslate, OpenAICompletions, ProviderFuture, ProviderKind, SpeechToText,
    TextTranslator, Whisper,
};
pub use settings::{Credentials, Settings};
pub use translator::{Translator, compose_output};
