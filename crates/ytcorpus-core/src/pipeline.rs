//! Pipeline driver.
//!
//! Sequences the stages over one dataset root:
//! fetch -> aggregate (`data.json`) -> transcribe -> aggregate
//! (`final_data.json`). The fetch phase runs under a bounded retry loop with
//! exponential backoff; only retryable failure classes re-enter the loop.

use std::path::Path;
use std::time::Duration;

use tokio::fs;
use tracing::{info, warn};

use crate::aggregate::Aggregator;
use crate::collab::{PlaylistResolver, SpeechTranscriber, VideoDownloader};
use crate::error::{CorpusError, Result};
use crate::fetch::{self, FetchStage, FetchSummary};
use crate::layout::DatasetLayout;
use crate::transcribe::{TranscribeSummary, TranscriptionStage};
use crate::types::Dataset;

/// Which phases run and how, passed in explicitly rather than read from
/// ambient state.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Delete and recreate the dataset root before anything else.
    pub reset: bool,
    pub fetch: bool,
    pub transcribe: bool,
    /// Recompute transcripts that are already present.
    pub force_transcribe: bool,
    pub max_fetch_attempts: u32,
    /// Initial backoff between fetch attempts; doubles each retry.
    pub retry_backoff: Duration,
    /// Per-video cap on each collaborator call. `None` disables it.
    pub video_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reset: false,
            fetch: true,
            transcribe: true,
            force_transcribe: false,
            max_fetch_attempts: 3,
            retry_backoff: Duration::from_secs(2),
            video_timeout: None,
        }
    }
}

/// What a full run did, for status reporting.
#[derive(Debug)]
pub struct PipelineReport {
    pub fetch: Option<FetchSummary>,
    pub transcribe: Option<TranscribeSummary>,
    /// Videos dropped from the last aggregate after a failed heal.
    pub irrecoverable: Vec<String>,
    /// The last aggregate written.
    pub dataset: Dataset,
}

pub struct Pipeline<'a> {
    layout: DatasetLayout,
    resolver: &'a dyn PlaylistResolver,
    downloader: &'a dyn VideoDownloader,
    transcriber: &'a dyn SpeechTranscriber,
    config: PipelineConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        layout: DatasetLayout,
        resolver: &'a dyn PlaylistResolver,
        downloader: &'a dyn VideoDownloader,
        transcriber: &'a dyn SpeechTranscriber,
        config: PipelineConfig,
    ) -> Self {
        Self {
            layout,
            resolver,
            downloader,
            transcriber,
            config,
        }
    }

    pub fn layout(&self) -> &DatasetLayout {
        &self.layout
    }

    /// Run the configured phases end to end.
    pub async fn run(&self, raw_urls_path: &Path) -> Result<PipelineReport> {
        self.init_root().await?;

        let fetch_stage = FetchStage::new(&self.layout, self.downloader)
            .with_timeout(self.config.video_timeout);
        let aggregator = Aggregator::new(&self.layout, &fetch_stage);

        let mut fetch_summary = None;
        if self.config.fetch {
            fetch_summary = Some(self.fetch_phase(&fetch_stage, raw_urls_path).await?);
        }

        let mut aggregate = aggregator.rebuild(&self.layout.data_path()).await?;

        let mut transcribe_summary = None;
        if self.config.transcribe {
            let stage = TranscriptionStage::new(&self.layout, self.transcriber)
                .force(self.config.force_transcribe)
                .with_timeout(self.config.video_timeout);
            transcribe_summary = Some(stage.run(&aggregate.dataset).await);
            aggregate = aggregator.rebuild(&self.layout.final_data_path()).await?;
        }

        info!("pipeline finished");
        Ok(PipelineReport {
            fetch: fetch_summary,
            transcribe: transcribe_summary,
            irrecoverable: aggregate.irrecoverable,
            dataset: aggregate.dataset,
        })
    }

    /// Resolve playlists and fetch every video, retrying the whole phase on
    /// retryable failures up to the configured attempt cap.
    async fn fetch_phase(
        &self,
        stage: &FetchStage<'_>,
        raw_urls_path: &Path,
    ) -> Result<FetchSummary> {
        let attempts = self.config.max_fetch_attempts.max(1);
        let mut backoff = self.config.retry_backoff;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.fetch_once(stage, raw_urls_path).await {
                Ok(summary) => return Ok(summary),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) if attempt >= attempts => {
                    warn!(attempt, error = %e, "fetch phase failed, giving up");
                    return Err(CorpusError::RetriesExhausted { attempts });
                }
                Err(e) => {
                    warn!(
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "fetch phase failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }

    async fn fetch_once(
        &self,
        stage: &FetchStage<'_>,
        raw_urls_path: &Path,
    ) -> Result<FetchSummary> {
        let playlists = fetch::prepare_input(&self.layout, self.resolver, raw_urls_path).await?;

        let mut summary = FetchSummary::default();
        for (playlist_id, record) in &playlists {
            summary.merge(stage.fetch_playlist(playlist_id, record).await);
        }
        Ok(summary)
    }

    async fn init_root(&self) -> Result<()> {
        let root = self.layout.root();
        if self.config.reset {
            match fs::remove_dir_all(root).await {
                Ok(()) => info!(root = %root.display(), "dataset root reset"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        fs::create_dir_all(root).await?;
        Ok(())
    }
}
