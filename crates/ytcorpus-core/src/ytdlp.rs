//! yt-dlp backed collaborator implementations.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::collab::{PlaylistResolver, ResolvedPlaylist, VideoDownloader};
use crate::error::{CorpusError, Result};
use crate::proc;
use crate::types::VideoMeta;

/// Playlist resolver and audio downloader shelling out to `yt-dlp`.
#[derive(Debug, Clone)]
pub struct YtDlp {
    /// Target bitrate passed to the mp3 extraction step.
    pub audio_quality: String,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self {
            audio_quality: "192K".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct PlaylistDump {
    title: Option<String>,
    #[serde(default)]
    entries: Vec<PlaylistEntry>,
}

#[derive(Deserialize)]
struct PlaylistEntry {
    url: Option<String>,
    id: Option<String>,
}

#[async_trait]
impl PlaylistResolver for YtDlp {
    async fn resolve(&self, playlist_url: &str) -> Result<ResolvedPlaylist> {
        info!(url = playlist_url, "resolving playlist");

        let output = proc::command("yt-dlp")
            .args(["--flat-playlist", "-J"])
            .arg(playlist_url)
            .output()
            .await?;

        if !output.status.success() {
            return Err(CorpusError::ResolveFailed {
                url: playlist_url.to_string(),
                reason: truncate_stderr(&output.stderr),
            });
        }

        let dump: PlaylistDump =
            serde_json::from_slice(&output.stdout).map_err(|e| CorpusError::ResolveFailed {
                url: playlist_url.to_string(),
                reason: format!("unexpected playlist dump: {e}"),
            })?;

        let video_urls: Vec<String> = dump
            .entries
            .into_iter()
            .filter_map(|entry| {
                entry
                    .url
                    .or_else(|| entry.id.map(|id| crate::ident::watch_url(&id)))
            })
            .collect();

        Ok(ResolvedPlaylist {
            title: dump.title.unwrap_or_else(|| playlist_url.to_string()),
            video_urls,
        })
    }
}

#[async_trait]
impl VideoDownloader for YtDlp {
    async fn download_audio(&self, video_url: &str, audio_path: &Path) -> Result<VideoMeta> {
        // Metadata pass first. If the video is gone or restricted this fails
        // before anything touches the disk.
        let info_output = proc::command("yt-dlp")
            .args(["--dump-json", "--no-download", "--no-playlist"])
            .arg(video_url)
            .output()
            .await?;

        if !info_output.status.success() {
            return Err(CorpusError::FetchFailed {
                url: video_url.to_string(),
                reason: truncate_stderr(&info_output.stderr),
            });
        }

        let meta: VideoMeta =
            serde_json::from_slice(&info_output.stdout).map_err(|e| CorpusError::FetchFailed {
                url: video_url.to_string(),
                reason: format!("unexpected metadata dump: {e}"),
            })?;

        // yt-dlp replaces the extension during extraction, so hand it the
        // stem and let the template produce `<video_id>.mp3`.
        let template = audio_path.with_extension("%(ext)s");
        let output = proc::command("yt-dlp")
            .args(["-f", "bestaudio/best"])
            .args(["--extract-audio", "--audio-format", "mp3"])
            .args(["--audio-quality", &self.audio_quality])
            .args(["--no-playlist", "--no-exec"])
            .arg("-o")
            .arg(&template)
            .arg(video_url)
            .output()
            .await?;

        if !output.status.success() {
            return Err(CorpusError::FetchFailed {
                url: video_url.to_string(),
                reason: truncate_stderr(&output.stderr),
            });
        }

        if !audio_path.exists() {
            return Err(CorpusError::FetchFailed {
                url: video_url.to_string(),
                reason: format!("no audio artifact at {}", audio_path.display()),
            });
        }

        debug!(path = %audio_path.display(), "audio downloaded");
        Ok(meta)
    }
}

/// Keep subprocess failure messages readable; yt-dlp can dump pages of stderr.
fn truncate_stderr(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr).chars().take(1000).collect()
}
