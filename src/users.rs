/// Read-only user directory
///
/// Maps the path segment of a personal landing URL to a display name.
/// The directory file is owned by the site operator; this server only
/// ever reads it.
use crate::error::{TabiError, TabiResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Lookup table backed by `user.json`
pub struct UserDirectory {
    path: PathBuf,
}

impl UserDirectory {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Resolve a user key to its display name.
    ///
    /// Re-reads the file on every call so operator edits take effect
    /// without a restart. A missing or corrupt file is an error the
    /// landing handler maps to a terminal gone response.
    pub async fn resolve(&self, key: &str) -> TabiResult<Option<String>> {
        let users = Self::load(&self.path).await?;
        Ok(users.get(key).cloned())
    }

    async fn load(path: &Path) -> TabiResult<HashMap<String, String>> {
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TabiError::NotFound(format!(
                    "user directory not found: {}",
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&raw)
            .map_err(|e| TabiError::MalformedData(format!("invalid JSON in user directory: {}", e)))
    }
}
