use std::collections::HashSet;
use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use log::info;
use serde::Deserialize;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::auth::current_user_id;
use crate::error::CoreError;
use crate::models::{
    Activity, ActivityType, CleaningStatus, NotificationType, Task, TaskPriority, TaskStatus,
    TaskType,
};
use crate::notifications::NotificationCenter;
use crate::store::DocumentStore;
use crate::teams::TeamRegistry;

/// Owns task records: creation, status transitions, cleaning reports,
/// and the derived activity log. Sole writer of task status.
pub struct TaskLedger {
    store: Arc<dyn DocumentStore>,
    registry: Arc<TeamRegistry>,
    notifier: Arc<NotificationCenter>,
}

/// Fields for a new task; status and timestamps are assigned here.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub assigned_to: String,
    pub assigned_by: String,
    pub team_id: String,
    pub priority: TaskPriority,
    pub task_type: TaskType,
    pub due_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
}

/// `cancelled` is terminal; the three live states transition freely
/// among each other. Same-state writes are rejected so `completed_at`
/// cannot be re-stamped by a repeated update.
fn transition_allowed(from: TaskStatus, to: TaskStatus) -> bool {
    use TaskStatus::*;
    match (from, to) {
        (Cancelled, _) => false,
        _ if from == to => false,
        (_, Cancelled) => true,
        (Pending | InProgress | Completed, Pending | InProgress | Completed) => true,
    }
}

impl TaskLedger {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        registry: Arc<TeamRegistry>,
        notifier: Arc<NotificationCenter>,
    ) -> Self {
        TaskLedger {
            store,
            registry,
            notifier,
        }
    }

    /// Persists a new task in `pending` status. Assigner and assignee
    /// must both be members of the target team.
    pub async fn create_task(&self, new_task: NewTask) -> Result<Task, CoreError> {
        if new_task.title.trim().is_empty() {
            return Err(CoreError::Validation("task title must not be empty".into()));
        }

        let team = self.registry.fetch_team(&new_task.team_id).await?;
        let is_member = |id: &str| team.members.iter().any(|m| m == id);
        if !is_member(&new_task.assigned_to) || !is_member(&new_task.assigned_by) {
            return Err(CoreError::NotTeamMember);
        }

        let task = Task {
            id: Uuid::new_v4().to_string(),
            title: new_task.title.clone(),
            description: new_task.description,
            assigned_to: new_task.assigned_to,
            assigned_by: new_task.assigned_by,
            team_id: new_task.team_id,
            priority: new_task.priority,
            status: TaskStatus::Pending,
            task_type: new_task.task_type,
            due_date: new_task.due_date,
            location: new_task.location,
            created_at: Utc::now(),
            completed_at: None,
        };
        self.store.insert_task(&task).await?;

        self.record_activity(
            &task.assigned_by,
            &task.team_id,
            ActivityType::TaskCreated,
            "New task created",
            &format!("Task \"{}\" was created", task.title),
            Some(task.id.clone()),
        )
        .await?;
        if task.task_type == TaskType::Issue {
            self.record_activity(
                &task.assigned_by,
                &task.team_id,
                ActivityType::IssueReported,
                "Issue reported",
                &task.title,
                Some(task.id.clone()),
            )
            .await?;
        }

        if task.assigned_to != task.assigned_by {
            self.notifier
                .create(
                    &task.assigned_to,
                    "New task assigned",
                    &task.title,
                    NotificationType::TaskAssigned,
                    Some(task.id.clone()),
                    Some(task.team_id.clone()),
                )
                .await?;
        }

        info!("Task created: {} ({})", task.title, task.id);
        Ok(task)
    }

    pub async fn get_task(&self, task_id: &str) -> Result<Task, CoreError> {
        self.store
            .get_task(task_id)
            .await?
            .ok_or(CoreError::NotFound)
    }

    /// Applies a status transition. Entering `completed` stamps
    /// `completed_at`, leaving it clears the stamp; a `task_completed`
    /// activity is recorded only on the transition into `completed`.
    pub async fn set_status(
        &self,
        task_id: &str,
        new_status: TaskStatus,
    ) -> Result<Task, CoreError> {
        let mut task = self.get_task(task_id).await?;
        if !transition_allowed(task.status, new_status) {
            return Err(CoreError::InvalidTransition);
        }

        let completed_at = if new_status == TaskStatus::Completed {
            Some(Utc::now())
        } else {
            None
        };
        if !self
            .store
            .set_task_status(task_id, new_status, completed_at)
            .await?
        {
            return Err(CoreError::NotFound);
        }
        task.status = new_status;
        task.completed_at = completed_at;

        if new_status == TaskStatus::Completed {
            self.record_activity(
                &task.assigned_to,
                &task.team_id,
                ActivityType::TaskCompleted,
                "Task completed",
                &format!("Task \"{}\" was completed", task.title),
                Some(task.id.clone()),
            )
            .await?;
            if task.assigned_by != task.assigned_to {
                self.notifier
                    .create(
                        &task.assigned_by,
                        "Task completed",
                        &task.title,
                        NotificationType::TaskCompleted,
                        Some(task.id.clone()),
                        Some(task.team_id.clone()),
                    )
                    .await?;
            }
        }

        info!("Task status updated: {} -> {:?}", task.id, new_status);
        Ok(task)
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Task>, CoreError> {
        Ok(self.store.list_tasks_for_user(user_id).await?)
    }

    pub async fn list_for_team(&self, team_id: &str) -> Result<Vec<Task>, CoreError> {
        Ok(self.store.list_tasks_for_team(team_id).await?)
    }

    /// Appends a cleaning report; the reporter must be a team member.
    pub async fn report_cleaning(
        &self,
        team_id: &str,
        location: &str,
        is_clean: bool,
        reported_by: &str,
        notes: Option<String>,
    ) -> Result<CleaningStatus, CoreError> {
        if location.trim().is_empty() {
            return Err(CoreError::Validation("location must not be empty".into()));
        }
        if !self.registry.is_member(team_id, reported_by).await? {
            return Err(CoreError::NotTeamMember);
        }

        let status = CleaningStatus {
            id: Uuid::new_v4().to_string(),
            team_id: team_id.to_string(),
            location: location.trim().to_string(),
            is_clean,
            reported_by: reported_by.to_string(),
            reported_at: Utc::now(),
            notes,
        };
        self.store.insert_cleaning_status(&status).await?;

        self.record_activity(
            reported_by,
            team_id,
            ActivityType::CleaningReported,
            "Cleaning status reported",
            &format!(
                "{} - {}",
                status.location,
                if is_clean { "Clean" } else { "Dirty" }
            ),
            None,
        )
        .await?;

        Ok(status)
    }

    pub async fn list_cleaning(&self, team_id: &str) -> Result<Vec<CleaningStatus>, CoreError> {
        Ok(self.store.list_cleaning_for_team(team_id).await?)
    }

    /// The latest report per location is the effective state; there is
    /// no stored "current status" singleton.
    pub async fn current_cleaning(&self, team_id: &str) -> Result<Vec<CleaningStatus>, CoreError> {
        let reports = self.store.list_cleaning_for_team(team_id).await?;
        let mut seen = HashSet::new();
        Ok(reports
            .into_iter()
            .filter(|report| seen.insert(report.location.clone()))
            .collect())
    }

    pub async fn list_activities(&self, team_id: &str) -> Result<Vec<Activity>, CoreError> {
        Ok(self.store.list_activities_for_team(team_id).await?)
    }

    async fn record_activity(
        &self,
        user_id: &str,
        team_id: &str,
        activity_type: ActivityType,
        title: &str,
        description: &str,
        related_task_id: Option<String>,
    ) -> Result<(), CoreError> {
        let activity = Activity {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            team_id: team_id.to_string(),
            activity_type,
            title: title.to_string(),
            description: description.to_string(),
            created_at: Utc::now(),
            related_task_id,
        };
        self.store.insert_activity(&activity).await?;
        Ok(())
    }
}

// ─── REQUEST PAYLOADS ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub assigned_to: String,
    pub team_id: String,
    pub priority: Option<TaskPriority>,
    pub task_type: Option<TaskType>,
    pub due_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskStatusRequest {
    pub status: TaskStatus,
}

#[derive(Debug, Deserialize)]
pub struct ReportCleaningRequest {
    pub location: String,
    pub is_clean: bool,
    pub notes: Option<String>,
}

// ─── ENDPOINTS ────────────────────────────────────────────────────────────────

// POST /tasks
// The authenticated user is the assigner.
pub async fn create_task(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<CreateTaskRequest>,
) -> Result<HttpResponse, CoreError> {
    let current_user = current_user_id(&req)?;
    let payload = payload.into_inner();
    let task = data
        .ledger
        .create_task(NewTask {
            title: payload.title,
            description: payload.description,
            assigned_to: payload.assigned_to,
            assigned_by: current_user,
            team_id: payload.team_id,
            priority: payload.priority.unwrap_or(TaskPriority::Medium),
            task_type: payload.task_type.unwrap_or(TaskType::Regular),
            due_date: payload.due_date,
            location: payload.location,
        })
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

// GET /tasks/{task_id}
pub async fn get_task(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, CoreError> {
    let task = data.ledger.get_task(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

// PUT /tasks/{task_id}/status
pub async fn update_task_status(
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UpdateTaskStatusRequest>,
) -> Result<HttpResponse, CoreError> {
    let task = data
        .ledger
        .set_status(&path.into_inner(), payload.status)
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

// GET /tasks/user/{user_id}
// Returns the tasks assigned to a user, newest first. Callers may only
// list their own tasks.
pub async fn list_user_tasks(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, CoreError> {
    let current_user = current_user_id(&req)?;
    let user_id = path.into_inner();
    if current_user != user_id {
        return Err(CoreError::Forbidden(
            "cannot access another user's tasks".into(),
        ));
    }
    let tasks = data.ledger.list_for_user(&user_id).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

// GET /tasks/team/{team_id}
pub async fn list_team_tasks(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, CoreError> {
    let current_user = current_user_id(&req)?;
    let team_id = path.into_inner();
    if !data.registry.is_member(&team_id, &current_user).await? {
        return Err(CoreError::Forbidden("not a member of this team".into()));
    }
    let tasks = data.ledger.list_for_team(&team_id).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

// POST /teams/{team_id}/cleaning
pub async fn report_cleaning(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<ReportCleaningRequest>,
) -> Result<HttpResponse, CoreError> {
    let current_user = current_user_id(&req)?;
    let payload = payload.into_inner();
    let status = data
        .ledger
        .report_cleaning(
            &path.into_inner(),
            &payload.location,
            payload.is_clean,
            &current_user,
            payload.notes,
        )
        .await?;
    Ok(HttpResponse::Ok().json(status))
}

// GET /teams/{team_id}/cleaning
pub async fn list_cleaning(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, CoreError> {
    let reports = data.ledger.list_cleaning(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(reports))
}

// GET /teams/{team_id}/cleaning/current
pub async fn current_cleaning(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, CoreError> {
    let current = data.ledger.current_cleaning(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(current))
}

// GET /teams/{team_id}/activities
pub async fn list_team_activities(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, CoreError> {
    let activities = data.ledger.list_activities(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(activities))
}

#[cfg(test)]
mod tests {
    use super::*;
    use TaskStatus::*;

    #[test]
    fn live_states_transition_freely() {
        for (from, to) in [
            (Pending, InProgress),
            (Pending, Completed),
            (InProgress, Pending),
            (InProgress, Completed),
            (Completed, InProgress),
            (Completed, Pending),
        ] {
            assert!(transition_allowed(from, to), "{from:?} -> {to:?}");
        }
    }

    #[test]
    fn cancelled_is_terminal() {
        for to in [Pending, InProgress, Completed, Cancelled] {
            assert!(!transition_allowed(Cancelled, to));
        }
        for from in [Pending, InProgress, Completed] {
            assert!(transition_allowed(from, Cancelled));
        }
    }

    #[test]
    fn same_state_writes_are_rejected() {
        for status in [Pending, InProgress, Completed, Cancelled] {
            assert!(!transition_allowed(status, status));
        }
    }
}
