use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::auth::current_user_id;
use crate::error::CoreError;
use crate::models::{User, UserRole};
use crate::store::{DocumentStore, UserPatch};

/// Maps authenticated principals to application-level user records and
/// roles. Leaf component; every mutation is a single document write.
pub struct IdentityDirectory {
    store: Arc<dyn DocumentStore>,
}

/// Counts of the records removed by an admin purge.
#[derive(Debug, Serialize)]
pub struct PurgeSummary {
    pub user_id: String,
    pub tasks_deleted: u64,
    pub activities_deleted: u64,
    pub notifications_deleted: u64,
    pub partner_requests_deleted: u64,
}

impl IdentityDirectory {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        IdentityDirectory { store }
    }

    pub async fn create_user(
        &self,
        email: &str,
        full_name: &str,
        role: UserRole,
        username: Option<String>,
    ) -> Result<User, CoreError> {
        if full_name.trim().is_empty() {
            return Err(CoreError::Validation("full name must not be empty".into()));
        }
        if let Some(username) = &username {
            if self.store.find_user_by_username(username).await?.is_some() {
                return Err(CoreError::DuplicateUsername);
            }
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            full_name: full_name.to_string(),
            username,
            role,
            team_id: None,
            created_at: Utc::now(),
            profile_image_url: None,
            fcm_token: None,
            notifications_enabled: true,
        };
        self.store.insert_user(&user).await?;
        info!("User created: {} ({:?})", user.email, user.role);
        Ok(user)
    }

    pub async fn get_user(&self, id: &str) -> Result<User, CoreError> {
        self.store.get_user(id).await?.ok_or(CoreError::NotFound)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<User, CoreError> {
        self.store
            .find_user_by_username(username)
            .await?
            .ok_or(CoreError::NotFound)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<User, CoreError> {
        self.store
            .find_user_by_email(email)
            .await?
            .ok_or(CoreError::NotFound)
    }

    pub async fn update_role(&self, id: &str, role: UserRole) -> Result<(), CoreError> {
        let patch = UserPatch {
            role: Some(role),
            ..UserPatch::default()
        };
        self.apply_patch(id, patch).await
    }

    pub async fn set_team(&self, id: &str, team_id: Option<String>) -> Result<(), CoreError> {
        let patch = UserPatch {
            team_id: Some(team_id),
            ..UserPatch::default()
        };
        self.apply_patch(id, patch).await
    }

    pub async fn update_profile(
        &self,
        id: &str,
        full_name: Option<String>,
        username: Option<String>,
    ) -> Result<User, CoreError> {
        if let Some(full_name) = &full_name {
            if full_name.trim().is_empty() {
                return Err(CoreError::Validation("full name must not be empty".into()));
            }
        }
        if let Some(username) = &username {
            if let Some(existing) = self.store.find_user_by_username(username).await? {
                if existing.id != id {
                    return Err(CoreError::DuplicateUsername);
                }
            }
        }

        let patch = UserPatch {
            full_name,
            username,
            ..UserPatch::default()
        };
        self.apply_patch(id, patch).await?;
        self.get_user(id).await
    }

    pub async fn set_fcm_token(&self, id: &str, token: Option<String>) -> Result<(), CoreError> {
        let patch = UserPatch {
            fcm_token: Some(token),
            ..UserPatch::default()
        };
        self.apply_patch(id, patch).await
    }

    pub async fn set_notifications_enabled(
        &self,
        id: &str,
        enabled: bool,
    ) -> Result<(), CoreError> {
        let patch = UserPatch {
            notifications_enabled: Some(enabled),
            ..UserPatch::default()
        };
        self.apply_patch(id, patch).await
    }

    /// Admin/debug tool: deletes the user addressed by email and
    /// cascades over their tasks, activities, notifications, partner
    /// requests, credentials and team membership.
    pub async fn purge_user(&self, email: &str) -> Result<PurgeSummary, CoreError> {
        let user = self.find_by_email(email).await?;
        warn!("Purging all data for user {} ({})", user.email, user.id);

        let tasks_deleted = self.store.delete_tasks_for_user(&user.id).await?;
        let activities_deleted = self.store.delete_activities_for_user(&user.id).await?;
        let notifications_deleted = self.store.delete_notifications_for_user(&user.id).await?;
        let partner_requests_deleted = self
            .store
            .delete_partner_requests_for_partner(&user.id)
            .await?;
        if let Some(team_id) = &user.team_id {
            self.store.remove_team_member(team_id, &user.id).await?;
        }
        self.store.delete_credential(&user.id).await?;
        self.store.delete_user(&user.id).await?;

        Ok(PurgeSummary {
            user_id: user.id,
            tasks_deleted,
            activities_deleted,
            notifications_deleted,
            partner_requests_deleted,
        })
    }

    async fn apply_patch(&self, id: &str, patch: UserPatch) -> Result<(), CoreError> {
        if self.store.update_user(id, patch).await? {
            Ok(())
        } else {
            Err(CoreError::NotFound)
        }
    }
}

// ─── REQUEST PAYLOADS ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FindUserQuery {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

#[derive(Debug, Deserialize)]
pub struct PurgeUserRequest {
    pub email: String,
}

// ─── ENDPOINTS ────────────────────────────────────────────────────────────────

// GET /users/{id}
pub async fn get_user_by_id(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, CoreError> {
    let user = data.directory.get_user(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}

// GET /users/find?username=...
pub async fn find_user(
    data: web::Data<AppState>,
    query: web::Query<FindUserQuery>,
) -> Result<HttpResponse, CoreError> {
    let user = data.directory.find_by_username(&query.username).await?;
    Ok(HttpResponse::Ok().json(user))
}

// PUT /users/profile
// Updates the authenticated user's own profile.
pub async fn update_profile(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, CoreError> {
    let current_user = current_user_id(&req)?;
    let payload = payload.into_inner();
    let user = data
        .directory
        .update_profile(&current_user, payload.full_name, payload.username)
        .await?;
    Ok(HttpResponse::Ok().json(user))
}

// PUT /users/{id}/role
// A founder or manager of the target's team may change the role.
pub async fn update_role(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UpdateRoleRequest>,
) -> Result<HttpResponse, CoreError> {
    let current_user = current_user_id(&req)?;
    let target_id = path.into_inner();

    let caller = data.directory.get_user(&current_user).await?;
    let target = data.directory.get_user(&target_id).await?;
    let same_team = caller.team_id.is_some() && caller.team_id == target.team_id;
    if !same_team || !matches!(caller.role, UserRole::Founder | UserRole::Manager) {
        return Err(CoreError::Forbidden(
            "only a founder or manager of the team can change roles".into(),
        ));
    }

    data.directory.update_role(&target_id, payload.role).await?;
    let user = data.directory.get_user(&target_id).await?;
    Ok(HttpResponse::Ok().json(user))
}

// DELETE /users/purge
// Admin/debug tool; removes a user and everything referencing them.
pub async fn purge_user(
    data: web::Data<AppState>,
    payload: web::Json<PurgeUserRequest>,
) -> Result<HttpResponse, CoreError> {
    let summary = data.directory.purge_user(&payload.email).await?;
    Ok(HttpResponse::Ok().json(summary))
}
