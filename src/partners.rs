use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::auth::current_user_id;
use crate::error::CoreError;
use crate::identity::IdentityDirectory;
use crate::models::{
    Activity, ActivityType, PartnerRequest, RequestStatus, TaskPriority, TaskType, UserRole,
};
use crate::store::{DocumentStore, PartnerReview};
use crate::tasks::{NewTask, TaskLedger};
use crate::teams::TeamRegistry;

/// Submission and review of partner service requests. Approval
/// generates a follow-up task through the ledger.
pub struct PartnerRequestWorkflow {
    store: Arc<dyn DocumentStore>,
    directory: Arc<IdentityDirectory>,
    registry: Arc<TeamRegistry>,
    ledger: Arc<TaskLedger>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl PartnerRequestWorkflow {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        directory: Arc<IdentityDirectory>,
        registry: Arc<TeamRegistry>,
        ledger: Arc<TaskLedger>,
    ) -> Self {
        PartnerRequestWorkflow {
            store,
            directory,
            registry,
            ledger,
        }
    }

    /// Submits a service request to a team. Only partner-role users may
    /// submit; the check lives here, not in the client.
    pub async fn submit_request(
        &self,
        partner_id: &str,
        team_id: &str,
        service_type: &str,
        description: &str,
    ) -> Result<PartnerRequest, CoreError> {
        if service_type.trim().is_empty() {
            return Err(CoreError::Validation(
                "service type must not be empty".into(),
            ));
        }

        let partner = self.directory.get_user(partner_id).await?;
        if partner.role != UserRole::Partner {
            return Err(CoreError::Forbidden(
                "only partners can submit service requests".into(),
            ));
        }
        self.registry.fetch_team(team_id).await?;

        let request = PartnerRequest {
            id: Uuid::new_v4().to_string(),
            partner_id: partner_id.to_string(),
            team_id: team_id.to_string(),
            service_type: service_type.trim().to_string(),
            description: description.to_string(),
            status: RequestStatus::Pending,
            created_at: Utc::now(),
            reviewed_by: None,
            reviewed_at: None,
            assigned_to: None,
        };
        self.store.insert_partner_request(&request).await?;
        info!(
            "Partner request submitted: {} for team {}",
            request.service_type, team_id
        );
        Ok(request)
    }

    /// Reviews a pending request exactly once. Approval requires an
    /// assignee; the generated task is written before the status
    /// flips, and a failed task write leaves the request pending.
    pub async fn review(
        &self,
        request_id: &str,
        decision: ReviewDecision,
        reviewer_id: &str,
        assign_to: Option<String>,
    ) -> Result<PartnerRequest, CoreError> {
        let request = self
            .store
            .get_partner_request(request_id)
            .await?
            .ok_or(CoreError::NotFound)?;
        if request.status != RequestStatus::Pending {
            return Err(CoreError::AlreadyReviewed);
        }

        let reviewer = self.directory.get_user(reviewer_id).await?;
        let team = self.registry.fetch_team(&request.team_id).await?;
        let reviewer_is_member = team.members.iter().any(|m| m == reviewer_id);
        if !reviewer_is_member || !matches!(reviewer.role, UserRole::Founder | UserRole::Manager) {
            return Err(CoreError::Forbidden(
                "only a founder or manager of the team can review requests".into(),
            ));
        }

        let review = match decision {
            ReviewDecision::Approved => {
                let assignee = assign_to.ok_or(CoreError::MissingAssignee)?;
                self.ledger
                    .create_task(NewTask {
                        title: format!("Partner: {}", request.service_type),
                        description: request.description.clone(),
                        assigned_to: assignee.clone(),
                        assigned_by: reviewer_id.to_string(),
                        team_id: request.team_id.clone(),
                        priority: TaskPriority::High,
                        task_type: TaskType::PartnerRequest,
                        due_date: None,
                        location: None,
                    })
                    .await?;

                let activity = Activity {
                    id: Uuid::new_v4().to_string(),
                    user_id: reviewer_id.to_string(),
                    team_id: request.team_id.clone(),
                    activity_type: ActivityType::PartnerRequestApproved,
                    title: "Service request approved".to_string(),
                    description: format!("A task was assigned for {}", request.service_type),
                    created_at: Utc::now(),
                    related_task_id: None,
                };
                self.store.insert_activity(&activity).await?;

                PartnerReview {
                    status: RequestStatus::Approved,
                    reviewed_by: reviewer_id.to_string(),
                    reviewed_at: Utc::now(),
                    assigned_to: Some(assignee),
                }
            }
            ReviewDecision::Rejected => PartnerReview {
                status: RequestStatus::Rejected,
                reviewed_by: reviewer_id.to_string(),
                reviewed_at: Utc::now(),
                assigned_to: None,
            },
        };

        if !self.store.apply_partner_review(request_id, &review).await? {
            return Err(CoreError::NotFound);
        }
        info!(
            "Partner request {} reviewed: {:?}",
            request_id, review.status
        );
        self.store
            .get_partner_request(request_id)
            .await?
            .ok_or(CoreError::NotFound)
    }

    pub async fn list_for_team(&self, team_id: &str) -> Result<Vec<PartnerRequest>, CoreError> {
        Ok(self.store.list_partner_requests_for_team(team_id).await?)
    }

    pub async fn list_for_partner(
        &self,
        partner_id: &str,
    ) -> Result<Vec<PartnerRequest>, CoreError> {
        Ok(self
            .store
            .list_partner_requests_for_partner(partner_id)
            .await?)
    }
}

// ─── REQUEST PAYLOADS ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubmitRequestRequest {
    pub team_id: String,
    pub service_type: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequestRequest {
    pub decision: ReviewDecision,
    pub assign_to: Option<String>,
}

// ─── ENDPOINTS ────────────────────────────────────────────────────────────────

// POST /partner_requests
// The authenticated user is the submitting partner.
pub async fn submit_request(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<SubmitRequestRequest>,
) -> Result<HttpResponse, CoreError> {
    let current_user = current_user_id(&req)?;
    let request = data
        .workflow
        .submit_request(
            &current_user,
            &payload.team_id,
            &payload.service_type,
            &payload.description,
        )
        .await?;
    Ok(HttpResponse::Ok().json(request))
}

// POST /partner_requests/{request_id}/review
pub async fn review_request(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<ReviewRequestRequest>,
) -> Result<HttpResponse, CoreError> {
    let current_user = current_user_id(&req)?;
    let payload = payload.into_inner();
    let request = data
        .workflow
        .review(
            &path.into_inner(),
            payload.decision,
            &current_user,
            payload.assign_to,
        )
        .await?;
    Ok(HttpResponse::Ok().json(request))
}

// GET /partner_requests/team/{team_id}
pub async fn list_team_requests(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, CoreError> {
    let current_user = current_user_id(&req)?;
    let team_id = path.into_inner();
    if !data.registry.is_member(&team_id, &current_user).await? {
        return Err(CoreError::Forbidden("not a member of this team".into()));
    }
    let requests = data.workflow.list_for_team(&team_id).await?;
    Ok(HttpResponse::Ok().json(requests))
}

// GET /partner_requests/mine
pub async fn list_my_requests(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> Result<HttpResponse, CoreError> {
    let current_user = current_user_id(&req)?;
    let requests = data.workflow.list_for_partner(&current_user).await?;
    Ok(HttpResponse::Ok().json(requests))
}
