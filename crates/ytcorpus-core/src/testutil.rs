//! In-memory collaborator fakes shared across stage tests.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::collab::{PlaylistResolver, ResolvedPlaylist, SpeechTranscriber, VideoDownloader};
use crate::error::{CorpusError, Result};
use crate::ident::extract_video_id;
use crate::types::{PlaylistRecord, Segment, VideoMeta};

pub fn playlist_record(video_urls: &[&str]) -> PlaylistRecord {
    PlaylistRecord {
        playlist_name: "fake playlist".to_string(),
        playlist_url: "https://www.youtube.com/playlist?list=FAKE".to_string(),
        video_urls: video_urls.iter().map(|u| u.to_string()).collect(),
    }
}

/// Downloader that writes a stub artifact and records every call.
#[derive(Default)]
pub struct FakeDownloader {
    calls: Mutex<Vec<String>>,
    fail_ids: BTreeSet<String>,
    duration: Option<f64>,
    delay: Option<std::time::Duration>,
}

impl FakeDownloader {
    pub fn failing_on(mut self, video_id: &str) -> Self {
        self.fail_ids.insert(video_id.to_string());
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Sleep this long before doing anything, to exercise timeouts.
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoDownloader for FakeDownloader {
    async fn download_audio(&self, video_url: &str, audio_path: &Path) -> Result<VideoMeta> {
        self.calls.lock().unwrap().push(video_url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let video_id = extract_video_id(video_url)?;

        if self.fail_ids.contains(&video_id) {
            return Err(CorpusError::FetchFailed {
                url: video_url.to_string(),
                reason: "simulated network failure".to_string(),
            });
        }

        if let Some(parent) = audio_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(audio_path, b"fake mp3 bytes")?;

        Ok(VideoMeta {
            title: Some(format!("video {video_id}")),
            description: Some("a description".to_string()),
            duration: Some(self.duration.unwrap_or(60.0)),
            playlist: Some("fake playlist".to_string()),
            upload_date: Some("20240101".to_string()),
            uploader: Some("uploader".to_string()),
            view_count: Some(1000),
            categories: Some(vec!["Education".to_string()]),
            tags: Some(vec!["test".to_string()]),
            chapters: None,
        })
    }
}

/// Resolver that returns the same video list for every playlist URL.
pub struct FakeResolver {
    video_urls: Vec<String>,
    fail_remaining: Mutex<u32>,
}

impl FakeResolver {
    pub fn new(video_urls: &[&str]) -> Self {
        Self {
            video_urls: video_urls.iter().map(|u| u.to_string()).collect(),
            fail_remaining: Mutex::new(0),
        }
    }

    /// Fail the next `n` resolve calls, then succeed.
    pub fn failing_times(self, n: u32) -> Self {
        *self.fail_remaining.lock().unwrap() = n;
        self
    }
}

#[async_trait]
impl PlaylistResolver for FakeResolver {
    async fn resolve(&self, playlist_url: &str) -> Result<ResolvedPlaylist> {
        let mut remaining = self.fail_remaining.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            return Err(CorpusError::ResolveFailed {
                url: playlist_url.to_string(),
                reason: "simulated resolver outage".to_string(),
            });
        }
        Ok(ResolvedPlaylist {
            title: "fake playlist".to_string(),
            video_urls: self.video_urls.clone(),
        })
    }
}

/// Transcriber returning two fixed segments, with optional per-path failure.
#[derive(Default)]
pub struct FakeTranscriber {
    calls: Mutex<Vec<String>>,
    fail_stems: BTreeSet<String>,
}

impl FakeTranscriber {
    pub fn failing_on(mut self, stem: &str) -> Self {
        self.fail_stems.insert(stem.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechTranscriber for FakeTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<Vec<Segment>> {
        self.calls
            .lock()
            .unwrap()
            .push(audio_path.display().to_string());

        let stem = audio_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.fail_stems.contains(&stem) {
            return Err(CorpusError::Transcription {
                audio_path: audio_path.to_path_buf(),
                reason: "simulated model failure".to_string(),
            });
        }

        Ok(vec![
            Segment {
                start: 0.0,
                end: 2.5,
                text: "hello".to_string(),
            },
            Segment {
                start: 2.5,
                end: 4.0,
                text: "world".to_string(),
            },
        ])
    }
}
