//! Speech-to-text via the faster-whisper CLI (`whisper-ctranslate2`).

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::collab::SpeechTranscriber;
use crate::error::{CorpusError, Result};
use crate::proc;
use crate::types::Segment;

/// Transcriber shelling out to `whisper-ctranslate2`.
#[derive(Debug, Clone)]
pub struct WhisperCli {
    pub model: String,
    /// Decoding beam width.
    pub beam_size: u32,
    /// Voice-activity filtering, drops long non-speech stretches.
    pub vad_filter: bool,
}

impl Default for WhisperCli {
    fn default() -> Self {
        Self {
            model: "small".to_string(),
            beam_size: 5,
            vad_filter: true,
        }
    }
}

#[derive(Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    segments: Vec<Segment>,
}

/// Fresh scratch directory per invocation. The tool names its output after
/// the input stem, which would collide both with the record file in the video
/// directory and with leftovers from earlier or concurrent runs in a shared
/// location.
fn scratch_dir() -> std::io::Result<tempfile::TempDir> {
    tempfile::Builder::new().prefix("ytcorpus-").tempdir()
}

#[async_trait]
impl SpeechTranscriber for WhisperCli {
    async fn transcribe(&self, audio_path: &Path) -> Result<Vec<Segment>> {
        let failed = |reason: String| CorpusError::Transcription {
            audio_path: audio_path.to_path_buf(),
            reason,
        };

        if !audio_path.is_file() {
            return Err(failed("audio file missing".to_string()));
        }

        let scratch = scratch_dir()?;

        let output = proc::command("whisper-ctranslate2")
            .arg(audio_path)
            .args(["--model", &self.model])
            .args(["--beam_size", &self.beam_size.to_string()])
            .args(["--vad_filter", if self.vad_filter { "True" } else { "False" }])
            .args(["--output_format", "json"])
            .arg("--output_dir")
            .arg(scratch.path())
            .output()
            .await?;

        if !output.status.success() {
            let stderr: String = String::from_utf8_lossy(&output.stderr)
                .chars()
                .take(1000)
                .collect();
            return Err(failed(stderr));
        }

        // Output file is named after the input stem; the scratch directory
        // cleans itself up on drop.
        let stem = audio_path
            .file_stem()
            .ok_or_else(|| failed("audio path has no file stem".to_string()))?;
        let json_path = scratch.path().join(stem).with_extension("json");

        let json = tokio::fs::read(&json_path)
            .await
            .map_err(|e| failed(format!("no transcriber output at {}: {e}", json_path.display())))?;

        let parsed: WhisperOutput =
            serde_json::from_slice(&json).map_err(|e| failed(format!("bad transcriber output: {e}")))?;

        debug!(
            path = %audio_path.display(),
            segments = parsed.segments.len(),
            "transcription complete"
        );
        Ok(parsed.segments)
    }
}
