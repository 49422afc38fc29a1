use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use log::info;
use serde::Deserialize;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::auth::current_user_id;
use crate::error::CoreError;
use crate::identity::IdentityDirectory;
use crate::models::{Notification, NotificationType};
use crate::store::DocumentStore;

const DEFAULT_INBOX_LIMIT: usize = 50;

/// Per-user notification documents and device-token bookkeeping. Push
/// delivery itself is an external concern; this component only writes
/// the records the messaging backend and the client inbox read.
pub struct NotificationCenter {
    store: Arc<dyn DocumentStore>,
    directory: Arc<IdentityDirectory>,
}

impl NotificationCenter {
    pub fn new(store: Arc<dyn DocumentStore>, directory: Arc<IdentityDirectory>) -> Self {
        NotificationCenter { store, directory }
    }

    /// Writes a notification document unless the target user has
    /// opted out. Returns the record when one was written.
    pub async fn create(
        &self,
        user_id: &str,
        title: &str,
        body: &str,
        notification_type: NotificationType,
        related_task_id: Option<String>,
        related_team_id: Option<String>,
    ) -> Result<Option<Notification>, CoreError> {
        let user = self.directory.get_user(user_id).await?;
        if !user.notifications_enabled {
            return Ok(None);
        }

        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            notification_type,
            is_read: false,
            created_at: Utc::now(),
            related_task_id,
            related_team_id,
        };
        self.store.insert_notification(&notification).await?;
        Ok(Some(notification))
    }

    pub async fn list_for_user(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Notification>, CoreError> {
        Ok(self
            .store
            .list_notifications_for_user(user_id, limit.unwrap_or(DEFAULT_INBOX_LIMIT))
            .await?)
    }

    pub async fn mark_read(&self, notification_id: &str) -> Result<(), CoreError> {
        if self.store.mark_notification_read(notification_id).await? {
            Ok(())
        } else {
            Err(CoreError::NotFound)
        }
    }

    pub async fn mark_all_read(&self, user_id: &str) -> Result<u64, CoreError> {
        Ok(self.store.mark_all_notifications_read(user_id).await?)
    }

    pub async fn delete(&self, notification_id: &str) -> Result<(), CoreError> {
        if self.store.delete_notification(notification_id).await? {
            Ok(())
        } else {
            Err(CoreError::NotFound)
        }
    }

    pub async fn save_token(&self, user_id: &str, token: &str) -> Result<(), CoreError> {
        self.directory
            .set_fcm_token(user_id, Some(token.to_string()))
            .await?;
        info!("FCM token saved for user {}", user_id);
        Ok(())
    }

    pub async fn clear_token(&self, user_id: &str) -> Result<(), CoreError> {
        self.directory.set_fcm_token(user_id, None).await
    }

    pub async fn set_enabled(&self, user_id: &str, enabled: bool) -> Result<(), CoreError> {
        self.directory
            .set_notifications_enabled(user_id, enabled)
            .await
    }
}

// ─── REQUEST PAYLOADS ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct InboxQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SaveTokenRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct NotificationSettingsRequest {
    pub enabled: bool,
}

// ─── ENDPOINTS ────────────────────────────────────────────────────────────────

// GET /notifications
pub async fn list_notifications(
    req: HttpRequest,
    data: web::Data<AppState>,
    query: web::Query<InboxQuery>,
) -> Result<HttpResponse, CoreError> {
    let current_user = current_user_id(&req)?;
    let notifications = data
        .notifications
        .list_for_user(&current_user, query.limit)
        .await?;
    Ok(HttpResponse::Ok().json(notifications))
}

// PUT /notifications/{id}/read
pub async fn mark_notification_read(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, CoreError> {
    data.notifications.mark_read(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().finish())
}

// PUT /notifications/read_all
pub async fn mark_all_notifications_read(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> Result<HttpResponse, CoreError> {
    let current_user = current_user_id(&req)?;
    let updated = data.notifications.mark_all_read(&current_user).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "updated": updated })))
}

// DELETE /notifications/{id}
pub async fn delete_notification(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, CoreError> {
    data.notifications.delete(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().finish())
}

// PUT /notifications/token
pub async fn save_fcm_token(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<SaveTokenRequest>,
) -> Result<HttpResponse, CoreError> {
    let current_user = current_user_id(&req)?;
    data.notifications
        .save_token(&current_user, &payload.token)
        .await?;
    Ok(HttpResponse::Ok().finish())
}

// DELETE /notifications/token
pub async fn clear_fcm_token(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> Result<HttpResponse, CoreError> {
    let current_user = current_user_id(&req)?;
    data.notifications.clear_token(&current_user).await?;
    Ok(HttpResponse::Ok().finish())
}

// PUT /notifications/settings
pub async fn update_notification_settings(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<NotificationSettingsRequest>,
) -> Result<HttpResponse, CoreError> {
    let current_user = current_user_id(&req)?;
    data.notifications
        .set_enabled(&current_user, payload.enabled)
        .await?;
    Ok(HttpResponse::Ok().finish())
}
