//! Requested file names and the directory scan behind `/list-files`.

use std::path::{Path, PathBuf};

use crate::tail::TailError;

/// A validated base file name inside the logs directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileName(String);

impl LogFileName {
    /// Validate `raw` as a base name carrying `extension`.
    pub fn parse(raw: &str, extension: &str) -> Result<Self, TailError> {
        let reject = |reason| TailError::InvalidName {
            name: raw.to_string(),
            reason,
        };

        if raw.is_empty() {
            return Err(reject("empty name"));
        }
        if raw.contains(['/', '\\', '\0']) || raw == "." || raw == ".." {
            return Err(reject("must be a base file name"));
        }
        if Path::new(raw).file_name().and_then(|n| n.to_str()) != Some(raw) {
            return Err(reject("must be a base file name"));
        }
        if !raw.ends_with(extension) {
            return Err(reject("unsupported file extension"));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn resolve(&self, root: &Path) -> PathBuf {
        root.join(&self.0)
    }
}

impl std::fmt::Display for LogFileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Names of the regular files directly under `root` ending in `extension`, sorted.
pub async fn list_log_files(root: &Path, extension: &str) -> std::io::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(root).await?;
    let mut names = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !name.ends_with(extension) {
            continue;
        }
        // follows symlinks, like the stream endpoint does
        match tokio::fs::metadata(entry.path()).await {
            Ok(meta) if meta.is_file() => names.push(name),
            _ => {}
        }
    }

    names.sort();
    Ok(names)
}
