mod common;

use base_of_office::error::CoreError;
use base_of_office::models::{NotificationType, TaskPriority, TaskType, UserRole};
use base_of_office::tasks::NewTask;
use common::TestContext;

#[tokio::test]
async fn duplicate_usernames_are_rejected() {
    let ctx = TestContext::new();
    ctx.state
        .directory
        .create_user("ada@test.com", "Ada", UserRole::Individual, Some("ada".into()))
        .await
        .unwrap();

    let err = ctx
        .state
        .directory
        .create_user("imposter@test.com", "Imposter", UserRole::Individual, Some("ada".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateUsername));

    // The same collision applies to later profile updates.
    let other = ctx.seed_user("Other", UserRole::Individual).await;
    let err = ctx
        .state
        .directory
        .update_profile(&other.id, None, Some("ada".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateUsername));
}

#[tokio::test]
async fn profile_update_keeps_own_username() {
    let ctx = TestContext::new();
    let user = ctx
        .state
        .directory
        .create_user("ada@test.com", "Ada", UserRole::Individual, Some("ada".into()))
        .await
        .unwrap();

    let updated = ctx
        .state
        .directory
        .update_profile(&user.id, Some("Ada Lovelace".into()), Some("ada".into()))
        .await
        .unwrap();
    assert_eq!(updated.full_name, "Ada Lovelace");
    assert_eq!(updated.username.as_deref(), Some("ada"));
}

#[tokio::test]
async fn purge_removes_user_and_their_records() {
    let ctx = TestContext::new();
    let (founder, team) = ctx.seed_team("Acme").await;
    let member = ctx.seed_member(&team, "Member").await;

    ctx.state
        .ledger
        .create_task(NewTask {
            title: "Water plants".to_string(),
            description: String::new(),
            assigned_to: member.id.clone(),
            assigned_by: founder.id.clone(),
            team_id: team.id.clone(),
            priority: TaskPriority::Low,
            task_type: TaskType::Regular,
            due_date: None,
            location: None,
        })
        .await
        .unwrap();

    let summary = ctx
        .state
        .directory
        .purge_user(&member.email)
        .await
        .unwrap();
    assert_eq!(summary.user_id, member.id);
    assert_eq!(summary.tasks_deleted, 1);

    let err = ctx.state.directory.get_user(&member.id).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound));

    // The team survives without the purged member.
    let team = ctx.state.registry.fetch_team(&team.id).await.unwrap();
    assert!(!team.members.contains(&member.id));
    assert!(team.members.contains(&founder.id));
    assert!(ctx
        .state
        .ledger
        .list_for_user(&member.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn opted_out_users_receive_no_notifications() {
    let ctx = TestContext::new();
    let (founder, team) = ctx.seed_team("Acme").await;
    let member = ctx.seed_member(&team, "Member").await;

    ctx.state
        .notifications
        .set_enabled(&member.id, false)
        .await
        .unwrap();

    ctx.state
        .ledger
        .create_task(NewTask {
            title: "Quiet task".to_string(),
            description: String::new(),
            assigned_to: member.id.clone(),
            assigned_by: founder.id.clone(),
            team_id: team.id.clone(),
            priority: TaskPriority::Medium,
            task_type: TaskType::Regular,
            due_date: None,
            location: None,
        })
        .await
        .unwrap();

    let inbox = ctx
        .state
        .notifications
        .list_for_user(&member.id, None)
        .await
        .unwrap();
    assert!(inbox.is_empty());
}

#[tokio::test]
async fn notification_inbox_read_flow() {
    let ctx = TestContext::new();
    let user = ctx.seed_user("Reader", UserRole::Individual).await;

    for i in 0..3 {
        ctx.state
            .notifications
            .create(
                &user.id,
                &format!("Note {}", i),
                "body",
                NotificationType::General,
                None,
                None,
            )
            .await
            .unwrap();
    }

    let inbox = ctx
        .state
        .notifications
        .list_for_user(&user.id, None)
        .await
        .unwrap();
    assert_eq!(inbox.len(), 3);
    assert!(inbox.iter().all(|n| !n.is_read));

    ctx.state
        .notifications
        .mark_read(&inbox[0].id)
        .await
        .unwrap();
    let marked = ctx.state.notifications.mark_all_read(&user.id).await.unwrap();
    assert_eq!(marked, 2);

    ctx.state.notifications.delete(&inbox[1].id).await.unwrap();
    let inbox = ctx
        .state
        .notifications
        .list_for_user(&user.id, None)
        .await
        .unwrap();
    assert_eq!(inbox.len(), 2);
    assert!(inbox.iter().all(|n| n.is_read));
}

#[tokio::test]
async fn fcm_token_save_and_clear() {
    let ctx = TestContext::new();
    let user = ctx.seed_user("Device", UserRole::Individual).await;

    ctx.state
        .notifications
        .save_token(&user.id, "token-123")
        .await
        .unwrap();
    let user_after = ctx.state.directory.get_user(&user.id).await.unwrap();
    assert_eq!(user_after.fcm_token.as_deref(), Some("token-123"));

    ctx.state.notifications.clear_token(&user.id).await.unwrap();
    let user_after = ctx.state.directory.get_user(&user.id).await.unwrap();
    assert!(user_after.fcm_token.is_none());
}

#[tokio::test]
async fn signup_and_login_flows() {
    let ctx = TestContext::new();

    let (_, user) = ctx
        .state
        .auth
        .sign_up(
            "Grace@Example.com",
            "hopper1",
            "Grace Hopper",
            UserRole::Founder,
            Some("grace".into()),
        )
        .await
        .unwrap();
    assert_eq!(user.email, "grace@example.com");

    // Email login, username login, wrong password.
    assert!(ctx
        .state
        .auth
        .sign_in("grace@example.com", "hopper1")
        .await
        .is_ok());
    let (_, by_username) = ctx.state.auth.sign_in("grace", "hopper1").await.unwrap();
    assert_eq!(by_username.id, user.id);
    let err = ctx
        .state
        .auth
        .sign_in("grace@example.com", "wrong-password")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Unauthorized));
}

#[tokio::test]
async fn signup_validation_rejects_bad_input() {
    let ctx = TestContext::new();

    let err = ctx
        .state
        .auth
        .sign_up("not-an-email", "longenough", "Name", UserRole::Individual, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let err = ctx
        .state
        .auth
        .sign_up("ok@example.com", "short", "Name", UserRole::Individual, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    ctx.state
        .auth
        .sign_up("taken@example.com", "longenough", "Name", UserRole::Individual, None)
        .await
        .unwrap();
    let err = ctx
        .state
        .auth
        .sign_up("taken@example.com", "longenough", "Name", UserRole::Individual, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}
