//! Ownership of the repository and its readiness.
//!
//! A [`DaoProvider`] owns the outcome of backend initialization. The outcome is
//! published exactly once through a `tokio::sync::watch` channel; everything
//! that needs the repository waits on that channel instead of inspecting a
//! possibly-unset field.
//!
//! ```
//! # use userdao::{DaoProvider, backend::BackendConfig};
//! # #[tokio::main]
//! # async fn main() -> userdao::Result<()> {
//! let provider = DaoProvider::init(BackendConfig::in_memory()).await?;
//! let repository = provider.repository().await?;
//! assert_eq!(repository.backend_name(), "memory");
//! # Ok(())
//! # }
//! ```

mod errors;

use std::fmt;
use std::sync::Arc;

use handle_trait::Handle;
use tokio::sync::watch;
use tracing::{Instrument, error, info, info_span};

pub use errors::ProviderError;

use crate::Result;
use crate::backend::{BackendConfig, BackendInitializer, SharedRepository};
use crate::commands::CommandRegistry;

/// Snapshot of the provider's initialization state.
#[derive(Clone)]
pub enum Readiness {
    /// Initialization is still running.
    Pending,
    /// The repository is available.
    Ready(SharedRepository),
    /// Initialization failed; the provider will never become ready.
    Failed(Arc<crate::Error>),
}

impl Readiness {
    pub fn is_pending(&self) -> bool {
        matches!(self, Readiness::Pending)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Readiness::Failed(_))
    }

    fn to_result(&self) -> Result<SharedRepository> {
        match self {
            Readiness::Pending => Err(ProviderError::NotReady.into()),
            Readiness::Ready(repo) => Ok(Arc::clone(repo)),
            Readiness::Failed(err) => Err(ProviderError::from_shared(Arc::clone(err)).into()),
        }
    }
}

impl fmt::Debug for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Readiness::Pending => f.write_str("Pending"),
            Readiness::Ready(repo) => f.debug_tuple("Ready").field(&repo.backend_name()).finish(),
            Readiness::Failed(err) => f.debug_tuple("Failed").field(&err.to_string()).finish(),
        }
    }
}

/// Owns the repository and hands it to the administrative commands.
///
/// Cloning is cheap: all clones observe the same readiness channel.
#[derive(Clone, Handle)]
pub struct DaoProvider {
    inner: Arc<ProviderInner>,
}

struct ProviderInner {
    readiness: watch::Receiver<Readiness>,
}

impl DaoProvider {
    /// Create a provider from a backend configuration.
    ///
    /// Without `parallel_init` this awaits initialization and returns its error.
    /// With `parallel_init` the backend is initialized on a background task and
    /// this returns immediately; the outcome is published through the
    /// readiness channel.
    pub async fn init(config: BackendConfig) -> Result<Self> {
        let initializer = BackendInitializer::new(config);

        if initializer.config().parallel_init {
            let (provider, handle) = Self::pending();
            tokio::spawn(
                async move {
                    info!("Initializing user directory in the background");
                    handle.complete(initializer.init().await);
                }
                .instrument(info_span!("backend_init")),
            );
            return Ok(provider);
        }

        match initializer.init().await {
            Ok(repository) => Ok(Self::with_repository(repository)),
            Err(err) => {
                error!(error = %err, "User directory backend failed to initialize");
                Err(ProviderError::backend_init(err).into())
            }
        }
    }

    /// Create a provider that is ready immediately with an externally owned repository.
    pub fn with_repository(repository: SharedRepository) -> Self {
        let (_sender, readiness) = watch::channel(Readiness::Ready(repository));
        Self::from_receiver(readiness)
    }

    /// Create a pending provider whose readiness the caller completes.
    pub fn pending() -> (Self, ReadinessHandle) {
        let (sender, readiness) = watch::channel(Readiness::Pending);
        (Self::from_receiver(readiness), ReadinessHandle { sender })
    }

    fn from_receiver(readiness: watch::Receiver<Readiness>) -> Self {
        Self {
            inner: Arc::new(ProviderInner { readiness }),
        }
    }

    /// Wait until initialization completes and return the repository.
    pub async fn repository(&self) -> Result<SharedRepository> {
        let mut readiness = self.inner.readiness.clone();
        let state = readiness
            .wait_for(|state| !state.is_pending())
            .await
            .map_err(|_| ProviderError::InitAborted)?;
        state.to_result()
    }

    /// Return the repository without waiting.
    ///
    /// Fails with [`ProviderError::NotReady`] while initialization is running.
    pub fn try_repository(&self) -> Result<SharedRepository> {
        let state = self.inner.readiness.borrow();
        if state.is_pending() && self.inner.readiness.has_changed().is_err() {
            return Err(ProviderError::InitAborted.into());
        }
        state.to_result()
    }

    /// Current initialization state.
    pub fn readiness(&self) -> Readiness {
        self.inner.readiness.borrow().clone()
    }

    /// Wait until initialization completes, surfacing its failure if any.
    pub async fn wait_ready(&self) -> Result<()> {
        self.repository().await.map(|_| ())
    }

    /// The administrative commands bound to this provider.
    pub fn commands(&self) -> CommandRegistry {
        CommandRegistry::new(self.handle())
    }
}

impl fmt::Debug for DaoProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DaoProvider")
            .field("readiness", &*self.inner.readiness.borrow())
            .finish()
    }
}

/// Write side of a pending provider's readiness channel.
///
/// Completing consumes the handle, so the outcome is published exactly once.
/// Dropping it without completing makes waiting callers fail with
/// [`ProviderError::InitAborted`].
#[derive(Debug)]
pub struct ReadinessHandle {
    sender: watch::Sender<Readiness>,
}

impl ReadinessHandle {
    /// Publish a usable repository.
    pub fn ready(self, repository: SharedRepository) {
        info!(backend = repository.backend_name(), "User directory is ready");
        self.sender.send_replace(Readiness::Ready(repository));
    }

    /// Publish an initialization failure.
    pub fn fail(self, err: impl Into<crate::Error>) {
        let err = err.into();
        error!(error = %err, "User directory backend failed to initialize");
        self.sender.send_replace(Readiness::Failed(Arc::new(err)));
    }

    /// Publish the outcome of an initialization attempt.
    pub fn complete(self, result: Result<SharedRepository>) {
        match result {
            Ok(repository) => self.ready(repository),
            Err(err) => self.fail(err),
        }
    }
}
