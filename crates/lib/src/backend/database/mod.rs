//! Concrete repository implementations
//!
//! [`InMemory`] is always available. The SQL repository is compiled in when
//! either the `sqlite` or `postgres` feature is enabled.

mod in_memory;
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub mod sql;

pub use in_memory::InMemory;
#[cfg(feature = "postgres")]
pub use sql::Postgres;
#[cfg(feature = "sqlite")]
pub use sql::Sqlite;
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub use sql::SqlxBackend;
