//! Where feed entries come from.

use std::path::PathBuf;

use tracing::debug;

use super::entities::FeedEntry;

/// Returns the entries currently published by a feed.
pub trait ContentProvider: Send + Sync {
    fn latest(&self) -> anyhow::Result<Vec<FeedEntry>>;
}

/// Provider with nothing to publish.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyProvider;

impl ContentProvider for EmptyProvider {
    fn latest(&self) -> anyhow::Result<Vec<FeedEntry>> {
        Ok(Vec::new())
    }
}

/// Reads a JSON array of entries from a file on every poll.
///
/// A missing file counts as an empty feed.
#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    path: PathBuf,
}

impl JsonFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ContentProvider for JsonFileProvider {
    fn latest(&self) -> anyhow::Result<Vec<FeedEntry>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Feed file not found");
                return Ok(Vec::new());
            },
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&raw)?)
    }
}
