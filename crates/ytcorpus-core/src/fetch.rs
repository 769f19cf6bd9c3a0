//! Resumable fetch stage.
//!
//! Ensures each video in each playlist has its audio artifact and metadata
//! record on disk, skipping work already done. The stage keeps no state of
//! its own; rerunning it processes only the missing videos.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use tokio::fs;
use tracing::{debug, info, warn};

use crate::collab::{PlaylistResolver, VideoDownloader};
use crate::error::{CorpusError, Result};
use crate::ident::extract_video_id;
use crate::layout::DatasetLayout;
use crate::store;
use crate::types::{PlaylistRecord, VideoRecord};

/// Result of a single per-video fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Audio and record were downloaded and persisted.
    Fetched(String),
    /// Both artifacts already existed; nothing was done.
    Skipped(String),
}

/// Per-playlist tally; failures are logged, never fatal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub fetched: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl FetchSummary {
    pub fn merge(&mut self, other: FetchSummary) {
        self.fetched += other.fetched;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

pub struct FetchStage<'a> {
    layout: &'a DatasetLayout,
    downloader: &'a dyn VideoDownloader,
    video_timeout: Option<Duration>,
}

impl<'a> FetchStage<'a> {
    pub fn new(layout: &'a DatasetLayout, downloader: &'a dyn VideoDownloader) -> Self {
        Self {
            layout,
            downloader,
            video_timeout: None,
        }
    }

    /// Cap each downloader invocation; a stuck download then fails the video
    /// instead of stalling the batch.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.video_timeout = timeout;
        self
    }

    /// A video counts as done only when the audio artifact exists and its
    /// metadata record loads cleanly. Checking the audio file alone would
    /// leave a window where the record is missing or corrupt but the video is
    /// never revisited.
    pub async fn is_complete(&self, playlist_id: &str, video_id: &str) -> bool {
        let audio = self.layout.audio_path(playlist_id, video_id);
        if !audio.is_file() {
            return false;
        }
        store::load::<VideoRecord>(&self.layout.record_path(playlist_id, video_id))
            .await
            .is_ok()
    }

    /// Fetch one video: derive its identifier, skip if already complete,
    /// otherwise download the audio and persist the metadata record.
    pub async fn fetch_video(&self, playlist_id: &str, video_url: &str) -> Result<FetchOutcome> {
        let video_id = extract_video_id(video_url)?;

        if self.is_complete(playlist_id, &video_id).await {
            debug!(video = %video_id, "already downloaded, skipping");
            return Ok(FetchOutcome::Skipped(video_id));
        }

        info!(video = %video_id, "downloading");
        fs::create_dir_all(self.layout.video_dir(playlist_id, &video_id)).await?;

        let audio_path = self.layout.audio_path(playlist_id, &video_id);
        let download = self.downloader.download_audio(video_url, &audio_path);
        let meta = match self.video_timeout {
            Some(limit) => tokio::time::timeout(limit, download).await.map_err(|_| {
                CorpusError::FetchFailed {
                    url: video_url.to_string(),
                    reason: format!("timed out after {}s", limit.as_secs()),
                }
            })??,
            None => download.await?,
        };

        let record = VideoRecord::from_meta(&video_id, meta);
        store::save(&self.layout.record_path(playlist_id, &video_id), &record).await?;
        info!(video = %video_id, "downloaded");
        Ok(FetchOutcome::Fetched(video_id))
    }

    /// Fetch every video of a playlist, best effort. A failing video is
    /// logged and counted; the rest of the playlist still runs.
    pub async fn fetch_playlist(
        &self,
        playlist_id: &str,
        record: &PlaylistRecord,
    ) -> FetchSummary {
        info!(
            playlist = %playlist_id,
            name = %record.playlist_name,
            videos = record.video_urls.len(),
            "fetching playlist"
        );

        // Even an empty playlist gets its directory, so it shows up in the
        // aggregate as `"<playlist_id>": {}`.
        if let Err(e) = fs::create_dir_all(self.layout.playlist_dir(playlist_id)).await {
            warn!(playlist = %playlist_id, error = %e, "cannot create playlist directory");
        }

        let mut summary = FetchSummary::default();
        for video_url in &record.video_urls {
            match self.fetch_video(playlist_id, video_url).await {
                Ok(FetchOutcome::Fetched(_)) => summary.fetched += 1,
                Ok(FetchOutcome::Skipped(_)) => summary.skipped += 1,
                Err(e) => {
                    warn!(url = %video_url, error = %e, "skipping video");
                    summary.failed += 1;
                }
            }
        }
        summary
    }
}

/// Resolve the raw playlist URL list into `processed_urls.json`.
///
/// Playlist identifiers are positional (`playlist_0`, `playlist_1`, ...), so
/// reordering the input file re-keys playlists on the next run. Resolver
/// failures propagate; the driver treats them as retryable.
pub async fn prepare_input(
    layout: &DatasetLayout,
    resolver: &dyn PlaylistResolver,
    raw_urls_path: &Path,
) -> Result<BTreeMap<String, PlaylistRecord>> {
    let urls: Vec<String> = store::load(raw_urls_path).await?;
    info!(count = urls.len(), path = %raw_urls_path.display(), "loaded playlist urls");

    let mut records = BTreeMap::new();
    for (index, playlist_url) in urls.iter().enumerate() {
        let resolved = resolver.resolve(playlist_url).await?;
        let playlist_id = format!("playlist_{index}");
        info!(
            playlist = %playlist_id,
            name = %resolved.title,
            videos = resolved.video_urls.len(),
            "playlist resolved"
        );
        records.insert(
            playlist_id,
            PlaylistRecord {
                playlist_name: resolved.title,
                playlist_url: playlist_url.clone(),
                video_urls: resolved.video_urls,
            },
        );
    }

    store::save(&layout.processed_urls_path(), &records).await?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{playlist_record, FakeDownloader, FakeResolver};
    use crate::types::PlaylistRecord;

    const V1: &str = "https://www.youtube.com/watch?v=vid001";
    const V2: &str = "https://www.youtube.com/watch?v=vid002";

    #[tokio::test]
    async fn fetches_missing_videos_and_persists_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DatasetLayout::new(dir.path());
        let downloader = FakeDownloader::default();
        let stage = FetchStage::new(&layout, &downloader);

        let summary = stage
            .fetch_playlist("playlist_0", &playlist_record(&[V1, V2]))
            .await;

        assert_eq!(summary.fetched, 2);
        assert_eq!(summary.failed, 0);
        assert!(layout.audio_path("playlist_0", "vid001").is_file());
        assert!(layout.record_path("playlist_0", "vid001").is_file());
        assert!(layout.audio_path("playlist_0", "vid002").is_file());
        assert_eq!(downloader.calls().len(), 2);
    }

    #[tokio::test]
    async fn refetch_is_a_no_op_once_complete() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DatasetLayout::new(dir.path());
        let downloader = FakeDownloader::default();
        let stage = FetchStage::new(&layout, &downloader);

        stage.fetch_video("playlist_0", V1).await.unwrap();
        let second = stage.fetch_video("playlist_0", V1).await.unwrap();

        assert_eq!(second, FetchOutcome::Skipped("vid001".into()));
        assert_eq!(downloader.calls().len(), 1);
    }

    #[tokio::test]
    async fn audio_without_record_is_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DatasetLayout::new(dir.path());
        let downloader = FakeDownloader::default();
        let stage = FetchStage::new(&layout, &downloader);

        stage.fetch_video("playlist_0", V1).await.unwrap();
        std::fs::remove_file(layout.record_path("playlist_0", "vid001")).unwrap();

        let outcome = stage.fetch_video("playlist_0", V1).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Fetched("vid001".into()));
        assert_eq!(downloader.calls().len(), 2);
        assert!(layout.record_path("playlist_0", "vid001").is_file());
    }

    #[tokio::test]
    async fn corrupt_record_is_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DatasetLayout::new(dir.path());
        let downloader = FakeDownloader::default();
        let stage = FetchStage::new(&layout, &downloader);

        stage.fetch_video("playlist_0", V1).await.unwrap();
        std::fs::write(layout.record_path("playlist_0", "vid001"), b"{ nope").unwrap();

        assert!(!stage.is_complete("playlist_0", "vid001").await);
        let outcome = stage.fetch_video("playlist_0", V1).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Fetched("vid001".into()));
    }

    #[tokio::test]
    async fn bad_url_and_download_failure_do_not_abort_the_playlist() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DatasetLayout::new(dir.path());
        let downloader = FakeDownloader::default().failing_on("vid001");
        let stage = FetchStage::new(&layout, &downloader);

        let record = PlaylistRecord {
            playlist_name: "p".into(),
            playlist_url: "https://www.youtube.com/playlist?list=X".into(),
            video_urls: vec!["https://example.com/nope".into(), V1.into(), V2.into()],
        };
        let summary = stage.fetch_playlist("playlist_0", &record).await;

        assert_eq!(summary.failed, 2);
        assert_eq!(summary.fetched, 1);
        assert!(layout.audio_path("playlist_0", "vid002").is_file());
    }

    #[tokio::test]
    async fn empty_playlist_still_appears_on_disk_and_in_the_aggregate() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DatasetLayout::new(dir.path());
        let downloader = FakeDownloader::default();
        let stage = FetchStage::new(&layout, &downloader);

        let summary = stage.fetch_playlist("playlist_0", &playlist_record(&[])).await;

        assert_eq!(summary, FetchSummary::default());
        assert!(layout.playlist_dir("playlist_0").is_dir());

        let report = crate::aggregate::Aggregator::new(&layout, &stage)
            .rebuild(&layout.data_path())
            .await
            .unwrap();
        assert!(report.dataset["playlist_0"].is_empty());
    }

    #[tokio::test]
    async fn slow_download_times_out_and_fails_the_video() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DatasetLayout::new(dir.path());
        let downloader = FakeDownloader::default().with_delay(Duration::from_millis(200));
        let stage =
            FetchStage::new(&layout, &downloader).with_timeout(Some(Duration::from_millis(20)));

        let err = stage.fetch_video("playlist_0", V1).await.unwrap_err();
        match err {
            CorpusError::FetchFailed { reason, .. } => {
                assert!(reason.contains("timed out"), "unexpected reason: {reason}");
            }
            other => panic!("expected FetchFailed, got {other:?}"),
        }
        assert!(!layout.audio_path("playlist_0", "vid001").exists());
    }

    #[tokio::test]
    async fn prepare_input_keys_playlists_by_position() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DatasetLayout::new(dir.path().join("dataset"));
        let raw = dir.path().join("raw_urls.json");
        store::save(
            &raw,
            &vec![
                "https://www.youtube.com/playlist?list=A".to_string(),
                "https://www.youtube.com/playlist?list=B".to_string(),
            ],
        )
        .await
        .unwrap();

        let resolver = FakeResolver::new(&[V1, V2]);
        let records = prepare_input(&layout, &resolver, &raw).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records["playlist_0"].video_urls.len(), 2);
        assert_eq!(
            records["playlist_1"].playlist_url,
            "https://www.youtube.com/playlist?list=B"
        );

        let persisted: BTreeMap<String, PlaylistRecord> =
            store::load(&layout.processed_urls_path()).await.unwrap();
        assert_eq!(persisted.len(), 2);
    }
}
