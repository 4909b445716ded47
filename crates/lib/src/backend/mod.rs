//! Repository backends for the user directory.
//!
//! This module provides the [`UserRepository`] trait and the pieces that turn a
//! configuration record into a live repository:
//!
//! * [`config`]: the configuration record and its layered resolution
//! * [`init`]: the [`BackendInitializer`] that connects a configured driver
//! * [`database`]: concrete repositories (in-memory, SQL)
//!
//! The rest of the crate only ever talks to a `dyn UserRepository`, so the
//! provider and the administrative commands are independent of the storage
//! engine behind it.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::Result;
use crate::user::UserRecord;

pub mod config;
pub mod database;
mod errors;
pub mod init;

pub use config::{BackendConfig, Dialect, Driver, ResolvedConfig};
pub use errors::{BackendError, BoxedCause};
pub use init::BackendInitializer;

/// Lazy sequence of records produced by [`UserRepository::find_all`].
///
/// Items are produced as the backend yields them; an `Err` item aborts the
/// listing and no further items should be expected.
pub type UserStream<'a> = BoxStream<'a, Result<UserRecord>>;

/// Persistence contract for user records.
///
/// Implementations must be `Send` and `Sync` so one instance can be shared
/// between the provider and every command invocation, and implement `Any` so a
/// host can downcast to a concrete backend for backend-specific operations
/// (e.g. saving an [`InMemory`](database::InMemory) directory to disk).
///
/// All calls are treated as blocking and non-cancelable by the callers; any
/// timeout policy belongs to the implementation.
#[async_trait]
pub trait UserRepository: Send + Sync + Any {
    /// Streams every record in the directory.
    fn find_all(&self) -> UserStream<'_>;

    /// Looks up a record by its unique username.
    ///
    /// # Returns
    /// `Ok(None)` when no record has that username. Errors are reserved for
    /// backend failures.
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>>;

    /// Persists a modified record, matching on its id.
    ///
    /// Fails with [`BackendError::UserNotFound`] if the record is gone.
    async fn update(&self, user: &UserRecord) -> Result<()>;

    /// Short name of the backend, used in log output.
    fn backend_name(&self) -> &'static str;

    /// Returns a reference to the repository as a dynamic `Any` type.
    fn as_any(&self) -> &dyn Any;
}

impl fmt::Debug for dyn UserRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRepository")
            .field("backend", &self.backend_name())
            .finish()
    }
}

/// Shared handle to a type-erased repository.
pub type SharedRepository = Arc<dyn UserRepository>;
