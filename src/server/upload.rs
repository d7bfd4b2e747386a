use axum::extract::Multipart;
use axum::extract::multipart::Field;
use std::collections::HashMap;
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::error::ServerError;
use crate::providers::AudioPayload;

pub(crate) const AUDIO_FIELD: &str = "audio";
pub(crate) const TARGET_LANGUAGE_FIELD: &str = "targetLanguage";

const TEMP_FILE_PREFIX: &str = "transcribe-translate-";
const FALLBACK_FILENAME: &str = "audio";

/// Uploaded audio spooled to a temp file. The file is deleted when this value
/// is dropped or consumed by [`UploadedAudio::into_payload`].
#[derive(Debug)]
pub(crate) struct UploadedAudio {
    file: NamedTempFile,
    filename: String,
    content_type: Option<String>,
    len: u64,
}

impl UploadedAudio {
    pub(crate) fn filename(&self) -> &str {
        &self.filename
    }

    pub(crate) fn len(&self) -> u64 {
        self.len
    }

    pub(crate) async fn into_payload(self) -> Result<AudioPayload, ServerError> {
        let UploadedAudio {
            file,
            filename,
            content_type,
            ..
        } = self;
        let bytes = tokio::fs::read(file.path()).await?;
        drop(file);
        Ok(AudioPayload {
            bytes,
            filename,
            content_type,
        })
    }
}

#[derive(Debug)]
pub(crate) struct UploadForm {
    pub(crate) audio: UploadedAudio,
    pub(crate) fields: HashMap<String, String>,
}

impl UploadForm {
    pub(crate) fn target_language(&self) -> Result<String, ServerError> {
        self.fields
            .get(TARGET_LANGUAGE_FIELD)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .ok_or(ServerError::MissingField(TARGET_LANGUAGE_FIELD))
    }
}

/// Reads every part of the request. The `audio` part must be a single file;
/// other named plain parts are collected as text fields and any other file
/// parts are discarded.
pub(crate) async fn read_upload(
    mut multipart: Multipart,
    tmp_dir: &Path,
) -> Result<UploadForm, ServerError> {
    let mut audio: Option<UploadedAudio> = None;
    let mut fields = HashMap::new();

    while let Some(field) = multipart.next_field().await.map_err(ServerError::parse)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == AUDIO_FIELD {
            if audio.is_some() {
                return Err(ServerError::MalformedUpload("audio field repeated"));
            }
            if field.file_name().is_none() {
                return Err(ServerError::MalformedUpload("audio field is not a file"));
            }
            audio = Some(spool_audio(field, tmp_dir).await?);
        } else if name.is_empty() || field.file_name().is_some() {
            skip_field(field).await?;
        } else {
            let value = field.text().await.map_err(ServerError::parse)?;
            fields.insert(name, value);
        }
    }

    let audio = audio.ok_or(ServerError::MalformedUpload("audio file is missing"))?;
    Ok(UploadForm { audio, fields })
}

async fn skip_field(mut field: Field<'_>) -> Result<(), ServerError> {
    let mut skipped = 0usize;
    while let Some(chunk) = field.chunk().await.map_err(ServerError::parse)? {
        skipped += chunk.len();
    }
    debug!(
        field = field.name().unwrap_or_default(),
        bytes = skipped,
        "ignored multipart part"
    );
    Ok(())
}

async fn spool_audio(mut field: Field<'_>, tmp_dir: &Path) -> Result<UploadedAudio, ServerError> {
    let filename = field
        .file_name()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(FALLBACK_FILENAME)
        .to_string();
    let content_type = field.content_type().map(str::to_string);

    let file = tempfile::Builder::new()
        .prefix(TEMP_FILE_PREFIX)
        .tempfile_in(tmp_dir)?;
    let mut writer = tokio::fs::File::from_std(file.as_file().try_clone()?);
    let mut len = 0u64;
    while let Some(chunk) = field.chunk().await.map_err(ServerError::parse)? {
        writer.write_all(&chunk).await?;
        len += chunk.len() as u64;
    }
    writer.flush().await?;

    debug!(
        filename = %filename,
        content_type = content_type.as_deref().unwrap_or("unknown"),
        bytes = len,
        path = %file.path().display(),
        "audio upload spooled"
    );

    Ok(UploadedAudio {
        file,
        filename,
        content_type,
        len,
    })
}
