use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use userdao::{
    DaoProvider, Permissions, Result, UserRecord,
    backend::{BackendError, SharedRepository, UserRepository, UserStream, database::InMemory},
};

// ==========================
// CORE TEST FACTORIES
// ==========================
// Single point of change for backend matrix testing via TEST_BACKEND env var.

/// Creates a repository holding `users`, based on the TEST_BACKEND env var.
///
/// Supported values:
/// - "inmemory" or unset: InMemory backend (default)
/// - "sqlite": SQLite in-memory backend (requires `sqlite` feature)
///
/// # Example
/// ```bash
/// # Run tests with InMemory (default)
/// cargo test
///
/// # Run tests with SQLite
/// TEST_BACKEND=sqlite cargo test --features sqlite
/// ```
pub async fn test_repository(users: &[UserRecord]) -> SharedRepository {
    match std::env::var("TEST_BACKEND").as_deref() {
        Ok("sqlite") => {
            #[cfg(feature = "sqlite")]
            {
                use userdao::backend::database::Sqlite;
                let backend = Sqlite::sqlite_in_memory()
                    .await
                    .expect("Failed to create SQLite backend");
                for user in users {
                    backend.insert_user(user).await.expect("Failed to seed user");
                }
                Arc::new(backend)
            }
            #[cfg(not(feature = "sqlite"))]
            {
                panic!("TEST_BACKEND=sqlite requires the 'sqlite' feature to be enabled")
            }
        }
        Ok("inmemory") | Ok("") | Err(_) => {
            let backend = InMemory::new();
            for user in users {
                backend.insert(user.clone()).expect("Failed to seed user");
            }
            Arc::new(backend)
        }
        Ok(other) => {
            panic!("Unknown TEST_BACKEND value: {other}. Supported: inmemory, sqlite")
        }
    }
}

/// A user with the given masks.
pub fn user_with(username: &str, permissions: u64, flags: u64) -> UserRecord {
    let mut user = UserRecord::new(username);
    user.permissions = Some(Permissions::new(permissions, flags));
    user
}

/// Arguments as the console would pass them.
pub fn args(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

// ==========================
// INSTRUMENTED REPOSITORIES
// ==========================

/// Wraps a repository and records every call made through it.
pub struct CountingRepository {
    inner: SharedRepository,
    find_all_calls: AtomicUsize,
    lookups: AtomicUsize,
    updates: Mutex<Vec<UserRecord>>,
}

impl CountingRepository {
    pub fn new(inner: SharedRepository) -> Arc<Self> {
        Arc::new(Self {
            inner,
            find_all_calls: AtomicUsize::new(0),
            lookups: AtomicUsize::new(0),
            updates: Mutex::new(Vec::new()),
        })
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn find_all_calls(&self) -> usize {
        self.find_all_calls.load(Ordering::SeqCst)
    }

    /// Records passed to `update`, in call order.
    pub fn updates(&self) -> Vec<UserRecord> {
        self.updates.lock().unwrap().clone()
    }

    /// Total number of repository calls of any kind.
    pub fn calls(&self) -> usize {
        self.lookups() + self.find_all_calls() + self.updates().len()
    }
}

#[async_trait]
impl UserRepository for CountingRepository {
    fn find_all(&self) -> UserStream<'_> {
        self.find_all_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_all()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_username(username).await
    }

    async fn update(&self, user: &UserRecord) -> Result<()> {
        self.updates.lock().unwrap().push(user.clone());
        self.inner.update(user).await
    }

    fn backend_name(&self) -> &'static str {
        "counting"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Serves lookups from an inner repository but fails every write.
pub struct FailingUpdateRepository {
    inner: SharedRepository,
}

impl FailingUpdateRepository {
    pub fn new(inner: SharedRepository) -> Arc<Self> {
        Arc::new(Self { inner })
    }
}

#[async_trait]
impl UserRepository for FailingUpdateRepository {
    fn find_all(&self) -> UserStream<'_> {
        self.inner.find_all()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        self.inner.find_by_username(username).await
    }

    async fn update(&self, _user: &UserRecord) -> Result<()> {
        Err(BackendError::SqlxError {
            reason: "connection reset by peer".to_string(),
            source: None,
        }
        .into())
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A provider over a counting wrapper of a seeded test repository.
pub async fn counted_provider(users: &[UserRecord]) -> (DaoProvider, Arc<CountingRepository>) {
    let counting = CountingRepository::new(test_repository(users).await);
    let provider = DaoProvider::with_repository(counting.clone());
    (provider, counting)
}
