//! Readiness of the provider and background initialization.

use std::sync::Arc;
use std::time::Duration;

use userdao::{
    BackendConfig, DaoProvider, UserRecord,
    backend::database::InMemory,
    commands::{RecordingReporter, ReportLevel},
    provider::{ProviderError, Readiness},
};

use crate::helpers::*;

#[tokio::test]
async fn test_commands_block_until_ready() {
    let (provider, handle) = DaoProvider::pending();
    let registry = provider.commands();
    let sink = Arc::new(RecordingReporter::new());

    let task = {
        let sink = Arc::clone(&sink);
        tokio::spawn(async move { registry.dispatch("listusers", &[], sink.as_ref()).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!task.is_finished(), "command must wait for readiness");
    assert!(sink.is_empty());
    assert!(provider.try_repository().unwrap_err().is_not_ready());

    handle.ready(test_repository(&[UserRecord::new("alice")]).await);

    task.await.unwrap().unwrap();
    assert_eq!(sink.messages(ReportLevel::Info), vec!["Listed 1 users"]);
    assert_eq!(sink.count(ReportLevel::SubInfo), 1);
}

#[tokio::test]
async fn test_failed_init_is_reported_as_backend_init_error() {
    let (provider, handle) = DaoProvider::pending();
    handle.fail(userdao::backend::BackendError::Connect {
        reason: "database is down".to_string(),
        source: None,
    });

    let sink = RecordingReporter::new();
    let err = provider
        .commands()
        .dispatch("getuser", &args(&["alice"]), &sink)
        .await
        .unwrap_err();

    assert!(err.is_backend_init_error());
    let errors = sink.messages(ReportLevel::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("getuser: "));
    assert!(errors[0].contains("database is down"));
    assert!(matches!(provider.readiness(), Readiness::Failed(_)));
}

#[tokio::test]
async fn test_abandoned_initialization() {
    let (provider, handle) = DaoProvider::pending();
    drop(handle);

    let err = provider.wait_ready().await.unwrap_err();
    assert!(matches!(
        err,
        userdao::Error::Provider(ProviderError::InitAborted)
    ));
    assert!(err.is_backend_init_error());
}

#[tokio::test]
async fn test_parallel_init_becomes_ready() {
    let config = BackendConfig::in_memory().with_parallel_init(true);
    let provider = DaoProvider::init(config).await.unwrap();

    // Whatever the current state, waiting resolves to the repository
    provider.wait_ready().await.unwrap();
    assert!(provider.readiness().is_ready());
    assert_eq!(provider.try_repository().unwrap().backend_name(), "memory");
}

#[tokio::test]
async fn test_parallel_init_failure_surfaces_later() {
    let config = BackendConfig::new("cassandra", "cql://localhost", "", "").with_parallel_init(true);
    let provider = DaoProvider::init(config).await.unwrap();

    let sink = RecordingReporter::new();
    let err = provider
        .commands()
        .dispatch("listusers", &[], &sink)
        .await
        .unwrap_err();
    assert!(err.is_backend_init_error());
    assert_eq!(sink.count(ReportLevel::Error), 1);
}

#[tokio::test]
async fn test_sequential_init_failure_is_returned() {
    let config = BackendConfig::new("memory", "memory:", "", "").with_pool_size(0);
    let err = DaoProvider::init(config).await.unwrap_err();
    assert!(err.is_backend_init_error());
    assert!(matches!(
        err,
        userdao::Error::Provider(ProviderError::BackendInit { .. })
    ));
}

#[tokio::test]
async fn test_clones_share_readiness() {
    let (provider, handle) = DaoProvider::pending();
    let clone = provider.clone();
    handle.ready(Arc::new(InMemory::new()));

    assert!(clone.readiness().is_ready());
    assert!(provider.try_repository().is_ok());
}
