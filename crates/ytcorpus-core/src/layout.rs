use std::path::{Path, PathBuf};

/// Deterministic paths under the dataset root.
///
/// ```text
/// <root>/processed_urls.json
/// <root>/<playlist_id>/<video_id>/<video_id>.mp3
/// <root>/<playlist_id>/<video_id>/<video_id>.json
/// <root>/data.json
/// <root>/final_data.json
/// ```
#[derive(Debug, Clone)]
pub struct DatasetLayout {
    root: PathBuf,
}

impl DatasetLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolved playlists, written once by input preparation.
    pub fn processed_urls_path(&self) -> PathBuf {
        self.root.join("processed_urls.json")
    }

    /// Aggregate dataset, pre-transcription.
    pub fn data_path(&self) -> PathBuf {
        self.root.join("data.json")
    }

    /// Aggregate dataset, post-transcription.
    pub fn final_data_path(&self) -> PathBuf {
        self.root.join("final_data.json")
    }

    pub fn playlist_dir(&self, playlist_id: &str) -> PathBuf {
        self.root.join(playlist_id)
    }

    pub fn video_dir(&self, playlist_id: &str, video_id: &str) -> PathBuf {
        self.root.join(playlist_id).join(video_id)
    }

    /// The audio artifact for a video.
    pub fn audio_path(&self, playlist_id: &str, video_id: &str) -> PathBuf {
        self.video_dir(playlist_id, video_id)
            .join(format!("{video_id}.mp3"))
    }

    /// The per-video metadata record.
    pub fn record_path(&self, playlist_id: &str, video_id: &str) -> PathBuf {
        self.video_dir(playlist_id, video_id)
            .join(format!("{video_id}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_keyed_by_both_identifiers() {
        let layout = DatasetLayout::new("dataset");
        assert_eq!(
            layout.audio_path("playlist_0", "abc"),
            PathBuf::from("dataset/playlist_0/abc/abc.mp3")
        );
        assert_eq!(
            layout.record_path("playlist_0", "abc"),
            PathBuf::from("dataset/playlist_0/abc/abc.json")
        );
        assert_eq!(
            layout.processed_urls_path(),
            PathBuf::from("dataset/processed_urls.json")
        );
    }
}
