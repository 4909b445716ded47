//! In-memory repository implementation
//!
//! This module provides an in-memory implementation of [`UserRepository`],
//! suitable for testing, development, or small deployments where the whole
//! directory fits in memory and is saved to a JSON file.

mod persistence;

use std::any::Any;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use futures::StreamExt;
use uuid::Uuid;

use crate::Result;
use crate::backend::errors::BackendError;
use crate::backend::{UserRepository, UserStream};
use crate::user::UserRecord;

/// A simple in-memory directory using a `HashMap` keyed by record id.
///
/// When opened with [`InMemory::open_file`] every successful [`update`](UserRepository::update)
/// rewrites the backing JSON file, so edits made from the console survive a restart.
#[derive(Debug, Default)]
pub struct InMemory {
    pub(crate) users: RwLock<HashMap<Uuid, UserRecord>>,
    /// File rewritten after every update, if any
    path: Option<PathBuf>,
}

impl InMemory {
    /// Creates a new, empty, ephemeral directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a directory backed by `path`, loading it if the file exists.
    pub async fn open_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut backend = if tokio::fs::try_exists(path)
            .await
            .map_err(|source| BackendError::FileIo { source })?
        {
            Self::load_from_file(path).await?
        } else {
            tracing::info!(path = %path.display(), "Starting with an empty user directory");
            Self::new()
        };
        backend.path = Some(path.to_path_buf());
        Ok(backend)
    }

    /// The file this directory is saved to after each update, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Adds a new record.
    ///
    /// Fails with [`BackendError::DuplicateUsername`] if the username is taken.
    /// This is how records enter the directory; the administrative commands
    /// never create users.
    pub fn insert(&self, user: UserRecord) -> Result<()> {
        let mut users = self.write();
        if users.values().any(|u| u.username == user.username) {
            return Err(BackendError::DuplicateUsername {
                username: user.username,
            }
            .into());
        }
        users.insert(user.id(), user);
        Ok(())
    }

    /// Number of records in the directory.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` if the directory holds no records.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, UserRecord>> {
        self.users.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, UserRecord>> {
        self.users.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of all records sorted by username.
    fn sorted_snapshot(&self) -> Vec<UserRecord> {
        let mut users: Vec<UserRecord> = self.read().values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        users
    }
}

#[async_trait]
impl UserRepository for InMemory {
    fn find_all(&self) -> UserStream<'_> {
        futures::stream::iter(self.sorted_snapshot().into_iter().map(Ok)).boxed()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .read()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn update(&self, user: &UserRecord) -> Result<()> {
        {
            let mut users = self.write();
            if !users.contains_key(&user.id()) {
                return Err(BackendError::UserNotFound { id: user.id() }.into());
            }
            if users
                .values()
                .any(|u| u.username == user.username && u.id() != user.id())
            {
                return Err(BackendError::DuplicateUsername {
                    username: user.username.clone(),
                }
                .into());
            }
            users.insert(user.id(), user.clone());
        }

        if let Some(path) = &self.path {
            self.save_to_file(path).await?;
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
