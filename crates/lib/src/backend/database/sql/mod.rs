//! SQL-based repository implementation.
//!
//! This module provides a SQL repository that implements [`UserRepository`],
//! storing user records in a relational database.
//!
//! ## Available Engines
//!
//! - **SQLite** (feature: `sqlite`): Embedded database
//! - **PostgreSQL** (feature: `postgres`): PostgreSQL database
//!
//! ## Architecture
//!
//! The repository uses sqlx with `AnyPool` for multi-database support. The
//! [`Dialect`] only matters for statements whose syntax differs between
//! engines; every query uses `$N` placeholders, which both engines accept.
//!
//! ## Schema
//!
//! The schema is defined in the [`schema`] module and automatically
//! initialized when connecting.

/// Schema definition and version check.
pub mod schema;
mod storage;

use std::any::Any;

use async_trait::async_trait;
use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;

use crate::Result;
use crate::backend::config::{Dialect, ResolvedConfig, redact_url};
use crate::backend::errors::BackendError;
use crate::backend::{UserRepository, UserStream};
use crate::user::UserRecord;

/// Extension trait for sqlx Result types to simplify error handling.
///
/// Similar to `anyhow::Context`, this trait adds methods to convert
/// sqlx errors to a [`BackendError`] with a context message.
pub(crate) trait SqlxResultExt<T> {
    /// Convert a sqlx error raised while using the pool.
    fn sql_context(self, context: &str) -> Result<T>;

    /// Convert a sqlx error raised while establishing the pool.
    fn connect_context(self, context: &str) -> Result<T>;
}

impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn sql_context(self, context: &str) -> Result<T> {
        self.map_err(|e| {
            BackendError::SqlxError {
                reason: format!("{context}: {e}"),
                source: Some(Box::new(e)),
            }
            .into()
        })
    }

    fn connect_context(self, context: &str) -> Result<T> {
        self.map_err(|e| {
            BackendError::Connect {
                reason: format!("{context}: {e}"),
                source: Some(Box::new(e)),
            }
            .into()
        })
    }
}

/// SQL repository implementing [`UserRepository`] using sqlx.
///
/// # Thread Safety
///
/// `SqlxBackend` is `Send + Sync` as required by `UserRepository`. The
/// underlying sqlx pool handles connection pooling and thread safety.
pub struct SqlxBackend {
    pool: AnyPool,
    dialect: Dialect,
}

impl SqlxBackend {
    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Get the SQL dialect in use.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Check if this backend is using SQLite.
    pub fn is_sqlite(&self) -> bool {
        self.dialect == Dialect::Sqlite
    }

    /// Check if this backend is using PostgreSQL.
    pub fn is_postgres(&self) -> bool {
        self.dialect == Dialect::Postgres
    }

    /// Connect using a resolved configuration and initialize the schema.
    ///
    /// The resolved config must carry a SQL dialect.
    pub async fn connect(config: &ResolvedConfig) -> Result<Self> {
        let dialect = config.dialect.ok_or_else(|| BackendError::InvalidConfig {
            reason: format!("driver {} has no SQL dialect", config.driver),
        })?;
        match dialect {
            Dialect::Sqlite => Self::connect_sqlite(&config.url, config.pool_size).await,
            Dialect::Postgres => Self::connect_postgres(&config.url, config.pool_size).await,
        }
    }

    /// Adds a new record.
    ///
    /// Fails with [`BackendError::DuplicateUsername`] if the username is taken.
    pub async fn insert_user(&self, user: &UserRecord) -> Result<()> {
        storage::insert(self, user).await
    }

    /// Number of records in the directory.
    pub async fn count_users(&self) -> Result<u64> {
        storage::count(self).await
    }

    /// Close the pool, waiting for connections to be released.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

// SQLite-specific implementations
#[cfg(feature = "sqlite")]
impl SqlxBackend {
    /// Open a SQLite database file at the given path.
    ///
    /// Creates the database file and schema if they don't exist.
    pub async fn open_sqlite<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        // mode=rwc: read-write-create (create file if it doesn't exist)
        let url = format!("sqlite:{}?mode=rwc", path.as_ref().display());
        Self::connect_sqlite(&url, crate::backend::config::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database using a connection URL.
    pub async fn connect_sqlite(url: &str, pool_size: u32) -> Result<Self> {
        // Install any driver support
        sqlx::any::install_default_drivers();

        // A plain `:memory:` database is private to one connection, so the pool
        // must never open a second one. Shared-cache in-memory databases are
        // destroyed once the last connection closes, so keep one alive.
        let is_private_memory = url.contains(":memory:");
        let is_in_memory = is_private_memory || url.contains("mode=memory");

        let pool = if is_in_memory {
            AnyPoolOptions::new()
                .max_connections(if is_private_memory { 1 } else { pool_size })
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(url)
                .await
                .connect_context("Failed to connect to SQLite")?
        } else {
            AnyPoolOptions::new()
                .max_connections(pool_size)
                .connect(url)
                .await
                .connect_context("Failed to connect to SQLite")?
        };

        if is_in_memory {
            sqlx::query("PRAGMA busy_timeout = 5000;")
                .execute(&pool)
                .await
                .connect_context("Failed to configure SQLite")?;
        } else {
            // - journal_mode=WAL: Write-Ahead Logging for better concurrency
            // - busy_timeout=5000: Wait up to 5s for locks before failing
            sqlx::query(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;",
            )
            .execute(&pool)
            .await
            .connect_context("Failed to configure SQLite")?;
        }

        let backend = Self {
            pool,
            dialect: Dialect::Sqlite,
        };
        schema::initialize(&backend).await?;

        tracing::info!(url = %redact_url(url), "Connected to SQLite user directory");
        Ok(backend)
    }

    /// Create an in-memory SQLite database.
    ///
    /// Uses a uniquely named shared-cache database so all pool connections see
    /// the same data while separate instances stay isolated.
    pub async fn sqlite_in_memory() -> Result<Self> {
        let unique_id = uuid::Uuid::new_v4();
        let url = format!("sqlite:file:mem_{unique_id}?mode=memory&cache=shared");
        Self::connect_sqlite(&url, crate::backend::config::DEFAULT_POOL_SIZE).await
    }
}

#[cfg(not(feature = "sqlite"))]
impl SqlxBackend {
    async fn connect_sqlite(_url: &str, _pool_size: u32) -> Result<Self> {
        Err(BackendError::DriverNotEnabled {
            driver: "sqlite".to_string(),
            feature: "sqlite",
        }
        .into())
    }
}

// PostgreSQL-specific implementations
#[cfg(feature = "postgres")]
impl SqlxBackend {
    /// Connect to a PostgreSQL database using a connection URL.
    pub async fn connect_postgres(url: &str, pool_size: u32) -> Result<Self> {
        // Install any driver support
        sqlx::any::install_default_drivers();

        let display_url = redact_url(url);
        let pool = AnyPoolOptions::new()
            .max_connections(pool_size)
            .connect(url)
            .await
            .connect_context(&format!("Failed to connect to PostgreSQL at {display_url}"))?;

        let backend = Self {
            pool,
            dialect: Dialect::Postgres,
        };
        schema::initialize(&backend).await?;

        tracing::info!(url = %display_url, "Connected to PostgreSQL user directory");
        Ok(backend)
    }
}

#[cfg(not(feature = "postgres"))]
impl SqlxBackend {
    async fn connect_postgres(_url: &str, _pool_size: u32) -> Result<Self> {
        Err(BackendError::DriverNotEnabled {
            driver: "postgres".to_string(),
            feature: "postgres",
        }
        .into())
    }
}

#[async_trait]
impl UserRepository for SqlxBackend {
    fn find_all(&self) -> UserStream<'_> {
        storage::find_all(self)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        storage::find_by_username(self, username).await
    }

    async fn update(&self, user: &UserRecord) -> Result<()> {
        storage::update(self, user).await
    }

    fn backend_name(&self) -> &'static str {
        match self.dialect {
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "postgres",
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(feature = "sqlite")]
/// Convenience type alias for SQLite backend using sqlx.
pub type Sqlite = SqlxBackend;

#[cfg(feature = "postgres")]
/// Convenience type alias for PostgreSQL backend using sqlx.
pub type Postgres = SqlxBackend;
