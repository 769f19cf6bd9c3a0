use url::Url;

use crate::error::{CorpusError, Result};

/// Derive the stable video identifier from a source URL.
///
/// The identifier doubles as a map key and a filesystem path component, so it
/// must be deterministic across runs. Accepts the usual YouTube URL shapes:
/// `watch?v=<id>`, `youtu.be/<id>`, `/shorts/<id>` and `/embed/<id>`.
pub fn extract_video_id(video_url: &str) -> Result<String> {
    let invalid = || CorpusError::InvalidUrl {
        url: video_url.to_string(),
    };

    let parsed = Url::parse(video_url.trim()).map_err(|_| invalid())?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid());
    }

    let host = parsed.host_str().ok_or_else(invalid)?;
    let host = host.strip_prefix("www.").unwrap_or(host);

    let candidate = match host {
        "youtu.be" => parsed
            .path_segments()
            .and_then(|mut segments| segments.next())
            .map(str::to_string),
        "youtube.com" | "m.youtube.com" | "music.youtube.com" => {
            let from_query = parsed
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned());
            from_query.or_else(|| {
                let segments: Vec<_> = parsed.path_segments()?.collect();
                match segments.as_slice() {
                    ["shorts", id] | ["embed", id] | ["v", id] => Some((*id).to_string()),
                    _ => None,
                }
            })
        }
        _ => None,
    };

    match candidate {
        Some(id) if is_valid_id(&id) => Ok(id),
        _ => Err(invalid()),
    }
}

/// Reconstruct a canonical watch URL from a video identifier.
///
/// Used by self-healing aggregation, where only the directory name survives.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
