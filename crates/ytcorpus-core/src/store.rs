//! JSON record persistence.
//!
//! Every record in the dataset goes through these two functions, so the
//! durability rules live in one place: parents are created on demand and
//! writes go to a temporary sibling first, then rename over the target. A
//! crash mid-write leaves the previous file intact.

use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;

use crate::error::{CorpusError, Result};

/// Load a JSON record from `path`.
///
/// `NotFound` when the file is absent, `Corrupted` when it exists but does
/// not parse as the expected shape.
pub async fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CorpusError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    serde_json::from_slice(&bytes).map_err(|source| CorpusError::Corrupted {
        path: path.to_path_buf(),
        source,
    })
}

/// Save a JSON record to `path`, pretty-printed.
pub async fn save<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json.as_bytes()).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}
