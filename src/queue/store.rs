//! Speaker queue persistence.
//!
//! The queue is stored as a JSON array of member identifiers, front first.
//! Every save overwrites the whole file.

use crate::error::StoreError;
use crate::platform::MemberId;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Flat-file store for the queue snapshot.
#[derive(Debug, Clone)]
pub struct QueueStore {
    path: PathBuf,
}

impl QueueStore {
    /// Create a store backed by `path`. Nothing is read until [`load`](Self::load).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved queue.
    ///
    /// A missing or unreadable file yields an empty queue; startup never
    /// fails because of the snapshot.
    pub async fn load(&self) -> Vec<MemberId> {
        let content = match tokio::fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No saved queue, starting empty");
                return Vec::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read saved queue, starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_slice::<Vec<MemberId>>(&content) {
            Ok(members) => members,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Saved queue is corrupt, starting empty");
                Vec::new()
            }
        }
    }

    /// Overwrite the snapshot with `members`.
    ///
    /// Writes a sibling temporary file and renames it over the target so a
    /// reader never observes a partial snapshot.
    pub async fn save<'a, I>(&self, members: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = &'a MemberId>,
    {
        let members: Vec<&MemberId> = members.into_iter().collect();
        let encoded = serde_json::to_vec(&members)?;

        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, &encoded).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), len = members.len(), "Queue saved");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
