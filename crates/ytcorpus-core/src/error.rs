use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("cannot derive a video id from {url}")]
    InvalidUrl { url: String },

    #[error("playlist resolution failed for {url}: {reason}")]
    ResolveFailed { url: String, reason: String },

    #[error("download failed for {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("record not found: {path}")]
    NotFound { path: PathBuf },

    #[error("record corrupted: {path}: {source}")]
    Corrupted {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("refetch of {video_id} failed, omitting it from the aggregate")]
    IrrecoverableFetch { video_id: String },

    #[error("transcription failed for {audio_path}: {reason}")]
    Transcription { audio_path: PathBuf, reason: String },

    #[error("fetch phase failed after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CorpusError {
    /// Whether the pipeline driver may retry the fetch phase after this error.
    ///
    /// Per-video failures are isolated inside the stages and never escape, so
    /// the only things worth retrying at the phase level are playlist
    /// resolution and filesystem trouble.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CorpusError::ResolveFailed { .. } | CorpusError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, CorpusError>;
