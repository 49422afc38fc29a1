mod common;

use base_of_office::error::CoreError;
use base_of_office::models::{
    ActivityType, RequestStatus, TaskPriority, TaskType, UserRole,
};
use base_of_office::partners::ReviewDecision;
use common::TestContext;

#[tokio::test]
async fn approval_generates_high_priority_task() {
    let ctx = TestContext::new();
    let (founder, team) = ctx.seed_team("Acme").await;
    let member = ctx.seed_member(&team, "Member").await;
    let partner = ctx.seed_user("Partner", UserRole::Partner).await;

    let request = ctx
        .state
        .workflow
        .submit_request(&partner.id, &team.id, "Catering", "Lunch for 20")
        .await
        .unwrap();
    assert_eq!(request.status, RequestStatus::Pending);

    let reviewed = ctx
        .state
        .workflow
        .review(
            &request.id,
            ReviewDecision::Approved,
            &founder.id,
            Some(member.id.clone()),
        )
        .await
        .unwrap();
    assert_eq!(reviewed.status, RequestStatus::Approved);
    assert_eq!(reviewed.reviewed_by.as_deref(), Some(founder.id.as_str()));
    assert!(reviewed.reviewed_at.is_some());
    assert_eq!(reviewed.assigned_to.as_deref(), Some(member.id.as_str()));

    let tasks = ctx.state.ledger.list_for_team(&team.id).await.unwrap();
    assert_eq!(tasks.len(), 1);
    let task = &tasks[0];
    assert_eq!(task.task_type, TaskType::PartnerRequest);
    assert_eq!(task.priority, TaskPriority::High);
    assert_eq!(task.assigned_to, member.id);
    assert_eq!(task.title, "Partner: Catering");
    assert_eq!(task.description, "Lunch for 20");

    let activities = ctx.state.ledger.list_activities(&team.id).await.unwrap();
    assert!(activities
        .iter()
        .any(|a| a.activity_type == ActivityType::PartnerRequestApproved));
}

#[tokio::test]
async fn approval_without_assignee_fails_without_mutation() {
    let ctx = TestContext::new();
    let (founder, team) = ctx.seed_team("Acme").await;
    let partner = ctx.seed_user("Partner", UserRole::Partner).await;

    let request = ctx
        .state
        .workflow
        .submit_request(&partner.id, &team.id, "Cleaning", "Weekly deep clean")
        .await
        .unwrap();

    let err = ctx
        .state
        .workflow
        .review(&request.id, ReviewDecision::Approved, &founder.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::MissingAssignee));

    let requests = ctx.state.workflow.list_for_team(&team.id).await.unwrap();
    assert_eq!(requests[0].status, RequestStatus::Pending);
    assert!(ctx
        .state
        .ledger
        .list_for_team(&team.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn reviews_are_single_shot() {
    let ctx = TestContext::new();
    let (founder, team) = ctx.seed_team("Acme").await;
    let member = ctx.seed_member(&team, "Member").await;
    let partner = ctx.seed_user("Partner", UserRole::Partner).await;

    let request = ctx
        .state
        .workflow
        .submit_request(&partner.id, &team.id, "Security", "Night patrol")
        .await
        .unwrap();
    ctx.state
        .workflow
        .review(
            &request.id,
            ReviewDecision::Approved,
            &founder.id,
            Some(member.id.clone()),
        )
        .await
        .unwrap();

    for decision in [ReviewDecision::Approved, ReviewDecision::Rejected] {
        let err = ctx
            .state
            .workflow
            .review(&request.id, decision, &founder.id, Some(member.id.clone()))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AlreadyReviewed));
    }

    // No duplicate task was generated by the failed re-reviews.
    assert_eq!(ctx.state.ledger.list_for_team(&team.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn rejection_updates_fields_and_creates_no_task() {
    let ctx = TestContext::new();
    let (founder, team) = ctx.seed_team("Acme").await;
    let partner = ctx.seed_user("Partner", UserRole::Partner).await;

    let request = ctx
        .state
        .workflow
        .submit_request(&partner.id, &team.id, "Landscaping", "Front lawn")
        .await
        .unwrap();
    let reviewed = ctx
        .state
        .workflow
        .review(&request.id, ReviewDecision::Rejected, &founder.id, None)
        .await
        .unwrap();

    assert_eq!(reviewed.status, RequestStatus::Rejected);
    assert_eq!(reviewed.reviewed_by.as_deref(), Some(founder.id.as_str()));
    assert!(reviewed.assigned_to.is_none());
    assert!(ctx
        .state
        .ledger
        .list_for_team(&team.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn submission_requires_partner_role() {
    let ctx = TestContext::new();
    let (_, team) = ctx.seed_team("Acme").await;
    let employee = ctx.seed_member(&team, "Employee").await;

    let err = ctx
        .state
        .workflow
        .submit_request(&employee.id, &team.id, "Catering", "Lunch")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Forbidden(_)));
}

#[tokio::test]
async fn review_requires_founder_or_manager_of_the_team() {
    let ctx = TestContext::new();
    let (_, team) = ctx.seed_team("Acme").await;
    let employee = ctx.seed_member(&team, "Employee").await;
    let partner = ctx.seed_user("Partner", UserRole::Partner).await;
    let (other_founder, _) = ctx.seed_team("Other").await;

    let request = ctx
        .state
        .workflow
        .submit_request(&partner.id, &team.id, "Catering", "Lunch")
        .await
        .unwrap();

    // A plain employee of the team cannot review.
    let err = ctx
        .state
        .workflow
        .review(
            &request.id,
            ReviewDecision::Approved,
            &employee.id,
            Some(employee.id.clone()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Forbidden(_)));

    // Neither can a founder of a different team.
    let err = ctx
        .state
        .workflow
        .review(
            &request.id,
            ReviewDecision::Rejected,
            &other_founder.id,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Forbidden(_)));

    let requests = ctx.state.workflow.list_for_team(&team.id).await.unwrap();
    assert_eq!(requests[0].status, RequestStatus::Pending);
}

#[tokio::test]
async fn failed_task_write_leaves_request_pending() {
    let ctx = TestContext::new();
    let (founder, team) = ctx.seed_team("Acme").await;
    let partner = ctx.seed_user("Partner", UserRole::Partner).await;
    let outsider = ctx.seed_user("Outsider", UserRole::Individual).await;

    let request = ctx
        .state
        .workflow
        .submit_request(&partner.id, &team.id, "Catering", "Lunch")
        .await
        .unwrap();

    // Assigning to a non-member fails the task write, which precedes
    // the status write; the request must stay pending.
    let err = ctx
        .state
        .workflow
        .review(
            &request.id,
            ReviewDecision::Approved,
            &founder.id,
            Some(outsider.id.clone()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotTeamMember));

    let requests = ctx.state.workflow.list_for_team(&team.id).await.unwrap();
    assert_eq!(requests[0].status, RequestStatus::Pending);
    assert!(requests[0].reviewed_by.is_none());
}

#[tokio::test]
async fn submission_to_unknown_team_fails() {
    let ctx = TestContext::new();
    let partner = ctx.seed_user("Partner", UserRole::Partner).await;

    let err = ctx
        .state
        .workflow
        .submit_request(&partner.id, "no-such-team", "Catering", "Lunch")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound));
}

#[tokio::test]
async fn partner_sees_their_own_requests() {
    let ctx = TestContext::new();
    let (_, team) = ctx.seed_team("Acme").await;
    let partner = ctx.seed_user("Partner", UserRole::Partner).await;

    ctx.state
        .workflow
        .submit_request(&partner.id, &team.id, "Catering", "Lunch")
        .await
        .unwrap();
    ctx.state
        .workflow
        .submit_request(&partner.id, &team.id, "Security", "Patrol")
        .await
        .unwrap();

    let mine = ctx
        .state
        .workflow
        .list_for_partner(&partner.id)
        .await
        .unwrap();
    assert_eq!(mine.len(), 2);
    assert_eq!(mine[0].service_type, "Security");
}
