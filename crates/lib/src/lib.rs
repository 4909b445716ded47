//!
//! Userdao: a user directory with bitmask permissions and an operator command surface.
//!
//! ## Core Concepts
//!
//! * **Permissions (`permissions::Permissions`)**: Two independent 64-bit masks per user, one for capabilities and one for flags.
//! * **User records (`user::UserRecord`)**: A unique username and immutable id, plus an optional permission model.
//! * **Repositories (`backend::UserRepository`)**: A pluggable persistence layer. In-memory (optionally saved to JSON), SQLite and PostgreSQL implementations are provided.
//! * **Provider (`provider::DaoProvider`)**: Owns the repository behind a one-shot readiness signal, so the backend can be initialized in the background.
//! * **Commands (`commands::CommandRegistry`)**: `listusers`, `getuser`, `setpermission` and `setflag`, reporting to a pluggable `commands::Reporter`.

pub mod backend;
pub mod commands;
pub mod permissions;
pub mod provider;
pub mod user;

pub use backend::{BackendConfig, UserRepository};
pub use commands::{CommandRegistry, Reporter};
pub use permissions::Permissions;
pub use provider::DaoProvider;
pub use user::UserRecord;

/// Result type used throughout the Userdao library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Userdao library.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured permission errors from the permissions module
    #[error(transparent)]
    Permission(permissions::PermissionError),

    /// Structured backend errors from the backend module
    #[error(transparent)]
    Backend(backend::BackendError),

    /// Structured readiness errors from the provider module
    #[error(transparent)]
    Provider(provider::ProviderError),

    /// Structured command errors from the commands module
    #[error(transparent)]
    Command(commands::CommandError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Permission(_) => "permissions",
            Error::Backend(_) => "backend",
            Error::Provider(_) => "provider",
            Error::Command(_) => "commands",
        }
    }

    /// Check if this error was caused by caller-supplied input.
    pub fn is_invalid_argument(&self) -> bool {
        match self {
            Error::Permission(err) => err.is_invalid_argument(),
            Error::Command(err) => err.is_invalid_argument(),
            _ => false,
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Backend(err) => err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error happened while bringing the backend up.
    pub fn is_backend_init_error(&self) -> bool {
        match self {
            Error::Backend(err) => err.is_init_error(),
            Error::Provider(err) => err.is_backend_init_error(),
            _ => false,
        }
    }

    /// Check if this error came from a repository call on a live backend.
    pub fn is_persistence_error(&self) -> bool {
        match self {
            Error::Backend(err) => err.is_persistence_error(),
            _ => false,
        }
    }

    /// Check if the backend is still initializing.
    pub fn is_not_ready(&self) -> bool {
        match self {
            Error::Provider(err) => err.is_not_ready(),
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Backend(err) => err.is_io_error(),
            _ => false,
        }
    }
}
