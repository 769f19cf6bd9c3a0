//! Dataset aggregation.
//!
//! Walks the on-disk tree and rebuilds the aggregate dataset from the
//! per-video records. A missing or corrupt record is treated as a fetch
//! failure: the video is refetched once, synchronously, and only dropped
//! from the aggregate when that also fails.

use std::path::Path;

use tokio::fs;
use tracing::{info, warn};

use crate::error::{CorpusError, Result};
use crate::fetch::FetchStage;
use crate::ident::watch_url;
use crate::layout::DatasetLayout;
use crate::store;
use crate::types::{Dataset, VideoRecord};

/// The rebuilt dataset plus the videos that could not be healed.
#[derive(Debug)]
pub struct AggregateReport {
    pub dataset: Dataset,
    /// Video ids whose record was unreadable and whose refetch also failed.
    pub irrecoverable: Vec<String>,
}

pub struct Aggregator<'a> {
    layout: &'a DatasetLayout,
    fetch: &'a FetchStage<'a>,
}

impl<'a> Aggregator<'a> {
    pub fn new(layout: &'a DatasetLayout, fetch: &'a FetchStage<'a>) -> Self {
        Self { layout, fetch }
    }

    /// Rebuild the aggregate from the tree and persist it at `output_path`.
    ///
    /// Pure over the per-video records apart from self-healing refetches:
    /// two runs against an unchanged tree produce identical output.
    pub async fn rebuild(&self, output_path: &Path) -> Result<AggregateReport> {
        let mut dataset = Dataset::new();
        let mut irrecoverable = Vec::new();

        let mut playlists = fs::read_dir(self.layout.root()).await?;
        while let Some(playlist_entry) = playlists.next_entry().await? {
            if !playlist_entry.file_type().await?.is_dir() {
                continue;
            }
            let playlist_id = playlist_entry.file_name().to_string_lossy().into_owned();
            let mut videos = std::collections::BTreeMap::new();

            let mut video_dirs = fs::read_dir(playlist_entry.path()).await?;
            while let Some(video_entry) = video_dirs.next_entry().await? {
                if !video_entry.file_type().await?.is_dir() {
                    continue;
                }
                let video_id = video_entry.file_name().to_string_lossy().into_owned();
                match self.load_or_heal(&playlist_id, &video_id).await {
                    Ok(record) => {
                        videos.insert(video_id, record);
                    }
                    Err(e) => {
                        warn!(playlist = %playlist_id, video = %video_id, error = %e, "omitting video");
                        irrecoverable.push(video_id);
                    }
                }
            }

            dataset.insert(playlist_id, videos);
        }

        store::save(output_path, &dataset).await?;
        info!(
            playlists = dataset.len(),
            path = %output_path.display(),
            "aggregate dataset written"
        );
        Ok(AggregateReport {
            dataset,
            irrecoverable,
        })
    }

    /// Load one record, refetching once when it is missing or corrupt.
    async fn load_or_heal(&self, playlist_id: &str, video_id: &str) -> Result<VideoRecord> {
        let record_path = self.layout.record_path(playlist_id, video_id);
        match store::load(&record_path).await {
            Ok(record) => Ok(record),
            Err(e @ (CorpusError::NotFound { .. } | CorpusError::Corrupted { .. })) => {
                warn!(video = %video_id, error = %e, "record unreadable, refetching");
                if let Err(fetch_err) = self
                    .fetch
                    .fetch_video(playlist_id, &watch_url(video_id))
                    .await
                {
                    warn!(video = %video_id, error = %fetch_err, "refetch failed");
                }
                store::load(&record_path)
                    .await
                    .map_err(|_| CorpusError::IrrecoverableFetch {
                        video_id: video_id.to_string(),
                    })
            }
            Err(e) => Err(e),
        }
    }
}

/// Total corpus duration in hours, summed over every video record.
pub fn total_duration_hours(dataset: &Dataset) -> f64 {
    dataset
        .values()
        .flat_map(|videos| videos.values())
        .map(|record| record.length)
        .sum::<f64>()
        / 3600.0
}
