//! ytcorpus core library
//!
//! Builds a corpus of timestamped speech transcripts from video playlists:
//! resumable audio download, speech-to-text, and incremental assembly of a
//! JSON dataset keyed by playlist and video identifiers.
//!
//! The per-video JSON records on disk are the source of truth; the aggregate
//! dataset files (`data.json`, `final_data.json`) are derived views that the
//! [`aggregate::Aggregator`] can always rebuild.

pub mod aggregate;
pub mod collab;
pub mod error;
pub mod fetch;
pub mod ident;
pub mod layout;
pub mod pipeline;
mod proc;
pub mod store;
pub mod transcribe;
pub mod types;
pub mod whisper;
pub mod ytdlp;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export commonly used items at crate root
pub use aggregate::{total_duration_hours, AggregateReport, Aggregator};
pub use collab::{PlaylistResolver, ResolvedPlaylist, SpeechTranscriber, VideoDownloader};
pub use error::{CorpusError, Result};
pub use fetch::{prepare_input, FetchOutcome, FetchStage, FetchSummary};
pub use ident::{extract_video_id, watch_url};
pub use layout::DatasetLayout;
pub use pipeline::{Pipeline, PipelineConfig, PipelineReport};
pub use transcribe::{TranscribeSummary, TranscriptionStage};
pub use types::{Chapter, Dataset, PlaylistRecord, Segment, Transcript, VideoMeta, VideoRecord};
pub use whisper::WhisperCli;
pub use ytdlp::YtDlp;
