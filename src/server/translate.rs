use axum::extract::Multipart;
use std::fmt;
use tracing::{debug, info, warn};

use super::error::{ServerError, Stage};
use super::models::ServerResponse;
use super::state::ServerState;
use super::upload::read_upload;

/// Progress of one request. Transitions only move forward; a failure in any
/// state ends the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RequestState {
    Receiving,
    Transcribing,
    Translating,
    Responded,
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestState::Receiving => "receiving",
            RequestState::Transcribing => "transcribing",
            RequestState::Translating => "translating",
            RequestState::Responded => "responded",
        };
        f.write_str(name)
    }
}

struct Progress(RequestState);

impl Progress {
    fn enter(&mut self, next: RequestState) {
        debug!(from = %self.0, to = %next, "request state");
        self.0 = next;
    }
}

pub(crate) async fn translate_request(
    state: &ServerState,
    multipart: Multipart,
) -> Result<ServerResponse, ServerError> {
    let mut progress = Progress(RequestState::Receiving);
    let result = run_stages(state, multipart, &mut progress).await;
    if let Err(err) = &result {
        warn!(state = %progress.0, error = %err, "request aborted");
    }
    progress.enter(RequestState::Responded);
    result
}

async fn run_stages(
    state: &ServerState,
    multipart: Multipart,
    progress: &mut Progress,
) -> Result<ServerResponse, ServerError> {
    let form = read_upload(multipart, &state.tmp_dir).await?;
    let target_language = form.target_language()?;
    let audio = form.audio;
    info!(
        filename = %audio.filename(),
        bytes = audio.len(),
        target_language = %target_language,
        "upload received"
    );

    progress.enter(RequestState::Transcribing);
    // the temp file is released once its bytes are read
    let payload = audio.into_payload().await?;
    let transcript = state
        .translator
        .transcribe(payload)
        .await
        .map_err(ServerError::provider(Stage::Transcription))?;

    progress.enter(RequestState::Translating);
    let translation = state
        .translator
        .translate(&transcript, &target_language)
        .await
        .map_err(ServerError::provider(Stage::Translation))?;

    Ok(ServerResponse { translation })
}
