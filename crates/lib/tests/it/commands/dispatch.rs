//! The dispatch error boundary and argument-count validation.

use userdao::{
    DaoProvider, UserRecord,
    commands::{CommandError, RecordingReporter, ReportLevel},
};

use crate::helpers::*;

#[tokio::test]
async fn test_missing_arguments_fail_before_repository_access() {
    let (provider, counting) = counted_provider(&[UserRecord::new("alice")]).await;

    for (command, given) in [
        ("getuser", &[][..]),
        ("setpermission", &["alice"][..]),
        ("setpermission", &["alice", "3"][..]),
        ("setflag", &["alice"][..]),
    ] {
        let sink = RecordingReporter::new();
        let err = provider
            .commands()
            .dispatch(command, &args(given), &sink)
            .await
            .unwrap_err();

        assert!(err.is_invalid_argument(), "{command}: {err}");
        assert_eq!(sink.count(ReportLevel::Error), 1);
        assert!(sink.messages(ReportLevel::Error)[0].starts_with(&format!("{command}: ")));
    }
    assert_eq!(counting.calls(), 0);
}

#[tokio::test]
async fn test_argument_count_checked_before_readiness() {
    // Never completed: a command that waited for readiness would hang
    let (provider, _handle) = DaoProvider::pending();
    let sink = RecordingReporter::new();

    let err = provider
        .commands()
        .dispatch("setpermission", &args(&["alice"]), &sink)
        .await
        .unwrap_err();

    assert!(err.is_invalid_argument());
}

#[tokio::test]
async fn test_unknown_command() {
    let (provider, counting) = counted_provider(&[]).await;
    let sink = RecordingReporter::new();

    let err = provider
        .commands()
        .dispatch("deleteuser", &args(&["alice"]), &sink)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        userdao::Error::Command(CommandError::UnknownCommand { .. })
    ));
    assert_eq!(
        sink.messages(ReportLevel::Error),
        vec!["deleteuser: unknown command 'deleteuser'"]
    );
    assert_eq!(counting.calls(), 0);
}

#[tokio::test]
async fn test_bound_command_metadata() {
    let (provider, _) = counted_provider(&[]).await;
    let registry = provider.commands();

    let described: Vec<(&str, usize)> = registry
        .iter()
        .map(|c| (c.name(), c.required_args()))
        .collect();
    assert_eq!(
        described,
        vec![
            ("getuser", 1),
            ("listusers", 0),
            ("setflag", 3),
            ("setpermission", 3),
        ]
    );
    assert_eq!(registry.len(), 4);
    assert!(!registry.get("getuser").unwrap().description().is_empty());
}

#[tokio::test]
async fn test_invoke_bypasses_error_reporting() {
    let (provider, _) = counted_provider(&[UserRecord::new("alice")]).await;
    let registry = provider.commands();
    let sink = RecordingReporter::new();

    let err = registry
        .get("getuser")
        .unwrap()
        .invoke(&[], &sink)
        .await
        .unwrap_err();

    // Only dispatch reports failures
    assert!(err.is_invalid_argument());
    assert!(sink.is_empty());
}
