//! Mutating commands: `setpermission` and `setflag`.

use userdao::{
    DaoProvider, Permissions, UserRecord,
    commands::{RecordingReporter, ReportLevel},
};

use crate::helpers::*;

#[tokio::test]
async fn test_setpermission_sets_bit_and_updates_once() {
    let alice = user_with("alice", 0, 0);
    let (provider, counting) = counted_provider(&[alice.clone()]).await;
    let sink = RecordingReporter::new();

    provider
        .commands()
        .dispatch("setpermission", &args(&["alice", "3", "true"]), &sink)
        .await
        .unwrap();

    let updates = counting.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].id(), alice.id());
    assert_eq!(updates[0].permissions, Some(Permissions::new(8, 0)));
    assert_eq!(
        sink.entries(),
        vec![(
            ReportLevel::Info,
            "Permission 3 of alice set to true".to_string()
        )]
    );

    // The change is persisted
    let repo = provider.repository().await.unwrap();
    let stored = repo.find_by_username("alice").await.unwrap().unwrap();
    assert_eq!(stored.permissions.unwrap().permissions, 8);
}

#[tokio::test]
async fn test_setflag_leaves_permissions_alone() {
    let (provider, counting) = counted_provider(&[user_with("bob", 0xFF, 0)]).await;
    let sink = RecordingReporter::new();

    provider
        .commands()
        .dispatch("setflag", &args(&["bob", "63", "TRUE"]), &sink)
        .await
        .unwrap();

    let updates = counting.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(
        updates[0].permissions,
        Some(Permissions::new(0xFF, 1 << 63))
    );
    assert_eq!(
        sink.messages(ReportLevel::Info),
        vec!["Flag 63 of bob set to true"]
    );
}

#[tokio::test]
async fn test_clearing_a_bit() {
    let (provider, counting) = counted_provider(&[user_with("carol", 0b1111, 0)]).await;
    let sink = RecordingReporter::new();

    provider
        .commands()
        .dispatch("setpermission", &args(&["carol", "1", "false"]), &sink)
        .await
        .unwrap();

    assert_eq!(
        counting.updates()[0].permissions,
        Some(Permissions::new(0b1101, 0))
    );
    assert_eq!(
        sink.messages(ReportLevel::Info),
        vec!["Permission 1 of carol set to false"]
    );
}

#[tokio::test]
async fn test_missing_model_is_materialized_on_write() {
    let legacy = UserRecord::with_id(uuid::Uuid::new_v4(), "legacy", None);
    let (provider, counting) = counted_provider(&[legacy]).await;
    let sink = RecordingReporter::new();

    provider
        .commands()
        .dispatch("setflag", &args(&["legacy", "0", "true"]), &sink)
        .await
        .unwrap();

    assert_eq!(
        counting.updates()[0].permissions,
        Some(Permissions::new(0, 1))
    );
}

#[tokio::test]
async fn test_set_on_missing_user_reports_not_found() {
    let (provider, counting) = counted_provider(&[UserRecord::new("alice")]).await;
    let sink = RecordingReporter::new();

    provider
        .commands()
        .dispatch("setpermission", &args(&["mallory", "3", "true"]), &sink)
        .await
        .unwrap();

    assert_eq!(
        sink.entries(),
        vec![(ReportLevel::Error, "User mallory not found".to_string())]
    );
    assert!(counting.updates().is_empty());
}

#[tokio::test]
async fn test_missing_user_wins_over_bad_input() {
    let (provider, counting) = counted_provider(&[UserRecord::new("alice")]).await;
    let sink = RecordingReporter::new();

    for case in [["ghost", "99", "true"], ["ghost", "3", "maybe"]] {
        provider
            .commands()
            .dispatch("setpermission", &args(&case), &sink)
            .await
            .unwrap();
    }

    assert_eq!(
        sink.entries(),
        vec![
            (ReportLevel::Error, "User ghost not found".to_string()),
            (ReportLevel::Error, "User ghost not found".to_string()),
        ]
    );
    assert_eq!(counting.lookups(), 2);
    assert!(counting.updates().is_empty());
}

#[tokio::test]
async fn test_bad_index_or_value_never_updates() {
    let cases: &[&[&str]] = &[
        &["alice", "64", "true"],
        &["alice", "-1", "true"],
        &["alice", "three", "true"],
        &["alice", "3", "yes"],
        &["alice", "3", "1"],
    ];

    for case in cases {
        for command in ["setpermission", "setflag"] {
            let (provider, counting) = counted_provider(&[user_with("alice", 0, 0)]).await;
            let sink = RecordingReporter::new();

            let err = provider
                .commands()
                .dispatch(command, &args(case), &sink)
                .await
                .unwrap_err();

            assert!(err.is_invalid_argument(), "{command} {case:?}: {err}");
            assert_eq!(sink.count(ReportLevel::Error), 1);
            assert_eq!(sink.count(ReportLevel::Info), 0);
            assert_eq!(counting.lookups(), 1);
            assert!(counting.updates().is_empty());

            let repo = provider.repository().await.unwrap();
            let stored = repo.find_by_username("alice").await.unwrap().unwrap();
            assert_eq!(stored.permissions, Some(Permissions::default()));
        }
    }
}

#[tokio::test]
async fn test_extra_arguments_are_ignored() {
    let (provider, counting) = counted_provider(&[user_with("alice", 0, 0)]).await;
    let sink = RecordingReporter::new();

    provider
        .commands()
        .dispatch(
            "setpermission",
            &args(&["alice", "2", "true", "--force", "please"]),
            &sink,
        )
        .await
        .unwrap();

    assert_eq!(counting.updates().len(), 1);
    assert_eq!(
        counting.updates()[0].permissions,
        Some(Permissions::new(4, 0))
    );
}

#[tokio::test]
async fn test_persistence_failure_is_reported_not_success() {
    let inner = test_repository(&[user_with("alice", 0, 0)]).await;
    let provider = DaoProvider::with_repository(FailingUpdateRepository::new(inner));
    let sink = RecordingReporter::new();

    let err = provider
        .commands()
        .dispatch("setpermission", &args(&["alice", "3", "true"]), &sink)
        .await
        .unwrap_err();

    assert!(err.is_persistence_error());
    assert_eq!(sink.count(ReportLevel::Info), 0);
    let errors = sink.messages(ReportLevel::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("setpermission: "));
    assert!(errors[0].contains("connection reset by peer"));
}
