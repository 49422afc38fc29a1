mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{
    Activity, CleaningStatus, Credential, Notification, PartnerRequest, RequestStatus, Task,
    TaskStatus, Team, User, UserRole,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Partial update of a user document. `None` leaves a field untouched;
/// for the nullable fields, `Some(None)` unsets the stored value.
#[derive(Debug, Default, Clone)]
pub struct UserPatch {
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub role: Option<UserRole>,
    pub team_id: Option<Option<String>>,
    pub fcm_token: Option<Option<String>>,
    pub notifications_enabled: Option<bool>,
}

/// Review fields applied to a partner request in one document write.
#[derive(Debug, Clone)]
pub struct PartnerReview {
    pub status: RequestStatus,
    pub reviewed_by: String,
    pub reviewed_at: DateTime<Utc>,
    pub assigned_to: Option<String>,
}

/// One shared abstraction over the backing document database:
/// collections of JSON-like entities keyed by generated string ids,
/// per-document atomic writes, no cross-document transactions.
///
/// `MongoStore` is the production implementation; `MemoryStore` backs
/// the local demo mode and the test suite.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // users
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;
    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    /// Returns false when the id does not resolve.
    async fn update_user(&self, id: &str, patch: UserPatch) -> Result<bool, StoreError>;
    async fn delete_user(&self, id: &str) -> Result<(), StoreError>;

    // credentials
    async fn insert_credential(&self, credential: &Credential) -> Result<(), StoreError>;
    async fn find_credential_by_email(&self, email: &str)
        -> Result<Option<Credential>, StoreError>;
    async fn delete_credential(&self, user_id: &str) -> Result<(), StoreError>;

    // teams
    async fn insert_team(&self, team: &Team) -> Result<(), StoreError>;
    async fn get_team(&self, id: &str) -> Result<Option<Team>, StoreError>;
    async fn find_team_by_invite_code(&self, code: &str) -> Result<Option<Team>, StoreError>;
    /// Atomic array-union append; returns false when the user was
    /// already a member.
    async fn add_team_member(&self, team_id: &str, user_id: &str) -> Result<bool, StoreError>;
    async fn remove_team_member(&self, team_id: &str, user_id: &str) -> Result<(), StoreError>;

    // tasks
    async fn insert_task(&self, task: &Task) -> Result<(), StoreError>;
    async fn get_task(&self, id: &str) -> Result<Option<Task>, StoreError>;
    /// Writes the status and sets or unsets `completedAt` in the same
    /// document update. Returns false when the id does not resolve.
    async fn set_task_status(
        &self,
        id: &str,
        status: TaskStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<bool, StoreError>;
    async fn list_tasks_for_user(&self, user_id: &str) -> Result<Vec<Task>, StoreError>;
    async fn list_tasks_for_team(&self, team_id: &str) -> Result<Vec<Task>, StoreError>;
    async fn delete_tasks_for_user(&self, user_id: &str) -> Result<u64, StoreError>;

    // activities
    async fn insert_activity(&self, activity: &Activity) -> Result<(), StoreError>;
    async fn list_activities_for_team(&self, team_id: &str) -> Result<Vec<Activity>, StoreError>;
    async fn delete_activities_for_user(&self, user_id: &str) -> Result<u64, StoreError>;

    // cleaning reports
    async fn insert_cleaning_status(&self, status: &CleaningStatus) -> Result<(), StoreError>;
    async fn list_cleaning_for_team(&self, team_id: &str)
        -> Result<Vec<CleaningStatus>, StoreError>;

    // partner requests
    async fn insert_partner_request(&self, request: &PartnerRequest) -> Result<(), StoreError>;
    async fn get_partner_request(&self, id: &str) -> Result<Option<PartnerRequest>, StoreError>;
    /// Returns false when the id does not resolve.
    async fn apply_partner_review(
        &self,
        id: &str,
        review: &PartnerReview,
    ) -> Result<bool, StoreError>;
    async fn list_partner_requests_for_team(
        &self,
        team_id: &str,
    ) -> Result<Vec<PartnerRequest>, StoreError>;
    async fn list_partner_requests_for_partner(
        &self,
        partner_id: &str,
    ) -> Result<Vec<PartnerRequest>, StoreError>;
    async fn delete_partner_requests_for_partner(
        &self,
        partner_id: &str,
    ) -> Result<u64, StoreError>;

    // notifications
    async fn insert_notification(&self, notification: &Notification) -> Result<(), StoreError>;
    async fn list_notifications_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Notification>, StoreError>;
    async fn mark_notification_read(&self, id: &str) -> Result<bool, StoreError>;
    async fn mark_all_notifications_read(&self, user_id: &str) -> Result<u64, StoreError>;
    async fn delete_notification(&self, id: &str) -> Result<bool, StoreError>;
    async fn delete_notifications_for_user(&self, user_id: &str) -> Result<u64, StoreError>;
}
