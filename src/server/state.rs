use std::path::PathBuf;

use crate::Translator;

/// Process-wide, read-only after startup.
#[derive(Clone)]
pub(crate) struct ServerState {
    pub(crate) translator: Translator,
    pub(crate) tmp_dir: PathBuf,
}
