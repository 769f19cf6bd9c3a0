//! External collaborator seams.
//!
//! The pipeline never talks to the network or a speech model directly; it
//! goes through these traits. Production implementations live in
//! [`crate::ytdlp`] and [`crate::whisper`]; tests substitute fakes.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Segment, VideoMeta};

/// A resolved playlist: display name plus its videos in playlist order.
#[derive(Debug, Clone)]
pub struct ResolvedPlaylist {
    pub title: String,
    pub video_urls: Vec<String>,
}

/// Resolves a playlist URL into its title and ordered video URLs.
#[async_trait]
pub trait PlaylistResolver: Send + Sync {
    async fn resolve(&self, playlist_url: &str) -> Result<ResolvedPlaylist>;
}

/// Downloads a video's best audio to `audio_path` and returns its metadata.
///
/// The implementation must leave the artifact at exactly `audio_path`; the
/// fetch stage uses that path as its idempotence key.
#[async_trait]
pub trait VideoDownloader: Send + Sync {
    async fn download_audio(&self, video_url: &str, audio_path: &Path) -> Result<VideoMeta>;
}

/// Transcribes an audio file into ordered, timestamped segments.
#[async_trait]
pub trait SpeechTranscriber: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> Result<Vec<Segment>>;
}
