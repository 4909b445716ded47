//! Backend error types for the user directory.
//!
//! Errors fall into two families: failures while building a repository
//! (configuration and connectivity) and failures while using one
//! (persistence). The `is_*` helpers classify them without matching on
//! individual variants.

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

/// Boxed error used for driver-specific causes.
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while initializing or using a repository backend.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BackendError {
    /// The configuration record is incomplete or inconsistent.
    #[error("Invalid backend configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem
        reason: String,
    },

    /// The configured driver name is unknown.
    #[error("Unsupported backend driver: {driver}")]
    UnsupportedDriver {
        /// The driver that was requested
        driver: String,
    },

    /// The configured driver is known but was compiled out.
    #[error("Backend driver {driver} is not enabled in this build (enable the `{feature}` feature)")]
    DriverNotEnabled {
        /// The driver that was requested
        driver: String,
        /// Cargo feature providing the driver
        feature: &'static str,
    },

    /// The external configuration file could not be read.
    #[error("Failed to read backend configuration file {}", .path.display())]
    ConfigFile {
        /// Path of the file
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The external configuration file is not valid JSON for a config record.
    #[error("Failed to parse backend configuration file {}", .path.display())]
    ConfigParse {
        /// Path of the file
        path: PathBuf,
        /// The underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// The backend could not be reached.
    #[error("Failed to connect to backend: {reason}")]
    Connect {
        /// Description including the redacted target
        reason: String,
        /// The driver error, if any
        #[source]
        source: Option<BoxedCause>,
    },

    /// A SQL statement failed after the backend was ready.
    #[error("SQL error: {reason}")]
    SqlxError {
        /// Context message
        reason: String,
        /// The driver error, if any
        #[source]
        source: Option<BoxedCause>,
    },

    /// File I/O error.
    #[error("File I/O error")]
    FileIo {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Serialization failed.
    #[error("Serialization failed")]
    SerializationFailed {
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// Deserialization failed.
    #[error("Deserialization failed")]
    DeserializationFailed {
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// An update targeted a record that no longer exists.
    #[error("User record not found: {id}")]
    UserNotFound {
        /// Id of the missing record
        id: Uuid,
    },

    /// A second record tried to claim an existing username.
    #[error("Username already exists: {username}")]
    DuplicateUsername {
        /// The conflicting username
        username: String,
    },

    /// A stored row could not be turned into a record.
    #[error("Corrupt user record: {reason}")]
    CorruptRecord {
        /// Description of the corruption
        reason: String,
    },
}

impl BackendError {
    /// Check if this error happened while building the repository.
    pub fn is_init_error(&self) -> bool {
        matches!(
            self,
            BackendError::InvalidConfig { .. }
                | BackendError::UnsupportedDriver { .. }
                | BackendError::DriverNotEnabled { .. }
                | BackendError::ConfigFile { .. }
                | BackendError::ConfigParse { .. }
                | BackendError::Connect { .. }
        )
    }

    /// Check if this error happened while reading or writing records.
    pub fn is_persistence_error(&self) -> bool {
        !self.is_init_error()
    }

    /// Check if this error is a configuration problem (as opposed to connectivity).
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            BackendError::InvalidConfig { .. }
                | BackendError::UnsupportedDriver { .. }
                | BackendError::DriverNotEnabled { .. }
                | BackendError::ConfigFile { .. }
                | BackendError::ConfigParse { .. }
        )
    }

    /// Check if this error indicates a record was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::UserNotFound { .. })
    }

    /// Check if this error is related to I/O or encoding.
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            BackendError::FileIo { .. }
                | BackendError::ConfigFile { .. }
                | BackendError::SerializationFailed { .. }
                | BackendError::DeserializationFailed { .. }
        )
    }
}

impl From<BackendError> for crate::Error {
    fn from(err: BackendError) -> Self {
        crate::Error::Backend(err)
    }
}
