use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One resolved playlist as stored in `processed_urls.json`.
///
/// Created once during input preparation and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistRecord {
    pub playlist_name: String,
    pub playlist_url: String,
    pub video_urls: Vec<String>,
}

/// A chapter marker as the downloader reports it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Chapter {
    pub start_time: f64,
    pub end_time: f64,
    pub title: String,
}

/// A single transcript segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Dense zero-based index -> segment, chronological order.
///
/// Serialized as a JSON object with stringified integer keys
/// (`"0"`, `"1"`, ...), ordered numerically.
pub type Transcript = BTreeMap<u32, Segment>;

/// Per-video metadata record, persisted as `<video_id>.json` next to the
/// audio artifact. The `transcript` field is attached later by the
/// transcription stage and omitted from JSON until then.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    pub filename: String,
    pub title: String,
    pub description: String,
    /// Duration in seconds.
    pub length: f64,
    pub playlist_name: String,
    pub upload_date: String,
    pub uploader: String,
    pub view_count: u64,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub chapters: Vec<Chapter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Transcript>,
}

/// Raw metadata bundle returned by the download collaborator.
///
/// Field names follow yt-dlp's `--dump-json` output, which omits or nulls
/// most of these for some extractors, hence the blanket `Option`s.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VideoMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration: Option<f64>,
    pub playlist: Option<String>,
    pub upload_date: Option<String>,
    pub uploader: Option<String>,
    pub view_count: Option<u64>,
    pub categories: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub chapters: Option<Vec<Chapter>>,
}

impl VideoRecord {
    /// Build a record for `video_id` from the downloader's metadata bundle.
    pub fn from_meta(video_id: &str, meta: VideoMeta) -> Self {
        Self {
            filename: video_id.to_string(),
            title: meta.title.unwrap_or_default(),
            description: meta.description.unwrap_or_default(),
            length: meta.duration.unwrap_or_default(),
            playlist_name: meta.playlist.unwrap_or_default(),
            upload_date: meta.upload_date.unwrap_or_default(),
            uploader: meta.uploader.unwrap_or_default(),
            view_count: meta.view_count.unwrap_or_default(),
            categories: meta.categories.unwrap_or_default(),
            tags: meta.tags.unwrap_or_default(),
            chapters: meta.chapters.unwrap_or_default(),
            transcript: None,
        }
    }
}

/// The aggregate dataset: playlist id -> video id -> record.
///
/// A derived view over the per-video records on disk; `BTreeMap` at both
/// levels keeps rebuilds byte-stable for an unchanged tree.
pub type Dataset = BTreeMap<String, BTreeMap<String, VideoRecord>>;
