//! services/api/src/adapters/file_storage.rs
//!
//! A `KeyValueStorage` backed by one file per key in a directory. Used when no
//! database is configured.

use async_trait::async_trait;
use chat_core::ports::{KeyValueStorage, PortError, PortResult};
use std::io::ErrorKind;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct FileStorageAdapter {
    root: PathBuf,
}

impl FileStorageAdapter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", escape_key(key)))
    }
}

/// Maps a key to a file name. Anything outside `[A-Za-z0-9@._-]` is percent-encoded,
/// so distinct keys never share a file.
fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'@' | b'.' | b'_' | b'-' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[async_trait]
impl KeyValueStorage for FileStorageAdapter {
    async fn get_item(&self, key: &str) -> PortResult<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PortError::Unexpected(format!("failed to read {}: {}", key, e))),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> PortResult<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Write beside the target, then rename over it.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| PortError::Unexpected(format!("failed to write {}: {}", key, e)))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| PortError::Unexpected(format!("failed to write {}: {}", key, e)))
    }
}
