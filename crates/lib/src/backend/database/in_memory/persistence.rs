//! Persistence operations for the InMemory directory
//!
//! This module handles serialization and file I/O for saving/loading
//! the in-memory directory to/from JSON files.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use serde::{Deserialize, Deserializer, Serialize};

use super::InMemory;
use crate::Result;
use crate::backend::errors::BackendError;
use crate::user::UserRecord;

/// The current persistence file format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const PERSISTENCE_VERSION: u8 = 0;

/// Helper to check if version is default (0) for serde skip_serializing_if
fn is_v0(v: &u8) -> bool {
    *v == 0
}

/// Validates the persistence version during deserialization.
fn validate_persistence_version<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != PERSISTENCE_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported persistence version {version}; only version {PERSISTENCE_VERSION} is supported"
        )));
    }
    Ok(version)
}

/// On-disk layout of an InMemory directory
#[derive(Serialize, Deserialize)]
struct SerializableDirectory {
    /// File format version for compatibility checking
    #[serde(
        rename = "_v",
        default,
        skip_serializing_if = "is_v0",
        deserialize_with = "validate_persistence_version"
    )]
    version: u8,
    #[serde(default)]
    users: Vec<UserRecord>,
}

impl InMemory {
    /// Saves the directory to a JSON file.
    ///
    /// Records are written sorted by username so the file diffs cleanly.
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let serializable = SerializableDirectory {
            version: PERSISTENCE_VERSION,
            users: self.sorted_snapshot(),
        };
        let json = serde_json::to_string_pretty(&serializable)
            .map_err(|source| BackendError::SerializationFailed { source })?;
        tokio::fs::write(path, json)
            .await
            .map_err(|source| BackendError::FileIo { source })?;
        tracing::debug!(path = %path.display(), users = serializable.users.len(), "Saved user directory");
        Ok(())
    }

    /// Loads a directory from a JSON file.
    ///
    /// The returned directory is ephemeral; use [`InMemory::open_file`] to keep
    /// writing back to the same file.
    pub async fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| BackendError::FileIo { source })?;
        let serializable: SerializableDirectory = serde_json::from_str(&json)
            .map_err(|source| BackendError::DeserializationFailed { source })?;

        let mut users = HashMap::with_capacity(serializable.users.len());
        for user in serializable.users {
            if users.values().any(|u: &UserRecord| u.username == user.username) {
                return Err(BackendError::DuplicateUsername {
                    username: user.username,
                }
                .into());
            }
            users.insert(user.id(), user);
        }
        tracing::info!(path = %path.display(), users = users.len(), "Loaded user directory");

        Ok(Self {
            users: RwLock::new(users),
            path: None,
        })
    }
}
