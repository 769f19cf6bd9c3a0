//! Resumable transcription stage.
//!
//! Walks every video referenced in the aggregate dataset and makes sure its
//! record carries a transcript. Videos that already have one are skipped
//! unless `force` is set, which makes reruns cheap after a partial batch.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::collab::SpeechTranscriber;
use crate::error::{CorpusError, Result};
use crate::layout::DatasetLayout;
use crate::store;
use crate::types::{Dataset, Segment, Transcript, VideoRecord};

/// Per-batch tally; failures are logged, never fatal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranscribeSummary {
    pub transcribed: usize,
    pub skipped: usize,
    pub failed: usize,
}

enum Outcome {
    Transcribed,
    Skipped,
}

pub struct TranscriptionStage<'a> {
    layout: &'a DatasetLayout,
    transcriber: &'a dyn SpeechTranscriber,
    force: bool,
    video_timeout: Option<Duration>,
}

impl<'a> TranscriptionStage<'a> {
    pub fn new(layout: &'a DatasetLayout, transcriber: &'a dyn SpeechTranscriber) -> Self {
        Self {
            layout,
            transcriber,
            force: false,
            video_timeout: None,
        }
    }

    /// Recompute transcripts even where one is already present.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Cap each transcriber invocation.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.video_timeout = timeout;
        self
    }

    /// Transcribe every video in the dataset, best effort. A failing video is
    /// logged and counted; the batch continues.
    pub async fn run(&self, dataset: &Dataset) -> TranscribeSummary {
        let mut summary = TranscribeSummary::default();
        for (playlist_id, videos) in dataset {
            for video_id in videos.keys() {
                match self.transcribe_video(playlist_id, video_id).await {
                    Ok(Outcome::Transcribed) => summary.transcribed += 1,
                    Ok(Outcome::Skipped) => summary.skipped += 1,
                    Err(e) => {
                        warn!(playlist = %playlist_id, video = %video_id, error = %e, "transcription skipped");
                        summary.failed += 1;
                    }
                }
            }
        }
        summary
    }

    async fn transcribe_video(&self, playlist_id: &str, video_id: &str) -> Result<Outcome> {
        let record_path = self.layout.record_path(playlist_id, video_id);
        let mut record: VideoRecord = store::load(&record_path).await?;

        if record.transcript.is_some() && !self.force {
            debug!(video = %video_id, "transcript present, skipping");
            return Ok(Outcome::Skipped);
        }

        let audio_path = self.layout.audio_path(playlist_id, video_id);
        if !audio_path.is_file() {
            return Err(CorpusError::Transcription {
                audio_path,
                reason: "audio artifact missing".to_string(),
            });
        }

        info!(video = %video_id, "transcribing");
        let transcription = self.transcriber.transcribe(&audio_path);
        let segments = match self.video_timeout {
            Some(limit) => tokio::time::timeout(limit, transcription)
                .await
                .map_err(|_| CorpusError::Transcription {
                    audio_path: audio_path.clone(),
                    reason: format!("timed out after {}s", limit.as_secs()),
                })??,
            None => transcription.await?,
        };

        record.transcript = Some(index_segments(&audio_path, segments)?);
        store::save(&record_path, &record).await?;
        info!(video = %video_id, "transcript attached");
        Ok(Outcome::Transcribed)
    }
}

/// Assign dense zero-based indices, rejecting unusable output.
///
/// Segments must carry finite timestamps, be chronological, and satisfy
/// `start <= end`; a transcriber that violates any of that produced garbage,
/// not a usable transcript. NaN compares false against everything, so the
/// finiteness check must come first.
fn index_segments(audio_path: &std::path::Path, segments: Vec<Segment>) -> Result<Transcript> {
    let mut previous_start = f64::NEG_INFINITY;
    for segment in &segments {
        let finite = segment.start.is_finite() && segment.end.is_finite();
        if !finite || segment.start < previous_start || segment.start > segment.end {
            return Err(CorpusError::Transcription {
                audio_path: audio_path.to_path_buf(),
                reason: format!(
                    "invalid segment timing: start {} end {}",
                    segment.start, segment.end
                ),
            });
        }
        previous_start = segment.start;
    }

    Ok(segments
        .into_iter()
        .enumerate()
        .map(|(i, segment)| (i as u32, segment))
        .collect())
}
