use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Application-level role of a user.
///
/// Wire values are the canonical set; `company` and `user` from older
/// client revisions map to `founder` and `employee` respectively.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Founder,
    Manager,
    Employee,
    Partner,
    Individual,
}

/// Represents a user in the system.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub role: UserRole,
    /// Weak reference to the team the user belongs to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    /// Push-messaging device token, stored opaquely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fcm_token: Option<String>,
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
}

fn default_true() -> bool {
    true
}

/// Represents a team sharing one invite code and task pool.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub founder_id: String,
    /// 6 uppercase alphanumeric characters, unique across live teams.
    pub invite_code: String,
    /// User ids; a unique set, insertion order irrelevant.
    pub members: Vec<String>,
    pub occupations: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Regular,
    Cleaning,
    Issue,
    PartnerRequest,
}

/// A unit of work assigned by one team member to another (or to self).
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub assigned_to: String,
    pub assigned_by: String,
    pub team_id: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    /// Physical location, for cleaning tasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Set exactly when status becomes `completed`, cleared on revert.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    TaskCreated,
    TaskCompleted,
    TeamJoined,
    CleaningReported,
    IssueReported,
    PartnerRequestApproved,
}

/// Append-only audit record; never mutated, only removed when a user
/// purge cascades over their records.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub team_id: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_task_id: Option<String>,
}

/// A timestamped report of whether a location is clean. The latest
/// report per location is the effective state.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CleaningStatus {
    #[serde(rename = "_id")]
    pub id: String,
    pub team_id: String,
    pub location: String,
    pub is_clean: bool,
    pub reported_by: String,
    pub reported_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// A service request submitted by a partner to a team. Transitions
/// pending -> approved or pending -> rejected exactly once.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PartnerRequest {
    #[serde(rename = "_id")]
    pub id: String,
    pub partner_id: String,
    pub team_id: String,
    pub service_type: String,
    pub description: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    TaskAssigned,
    TaskCompleted,
    TeamJoined,
    PartnerRequest,
    CleaningAlert,
    General,
}

/// A per-user notification document, displayed in the client's inbox.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub body: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_team_id: Option<String>,
}

/// Login credentials. Stored in their own collection, never on the
/// user document.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    #[serde(rename = "_id")]
    pub user_id: String,
    pub email: String,
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_enums_serialize_to_wire_values() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(
            serde_json::to_string(&TaskType::PartnerRequest).unwrap(),
            "\"partner_request\""
        );
        assert_eq!(
            serde_json::to_string(&TaskPriority::Critical).unwrap(),
            "\"critical\""
        );
        assert_eq!(
            serde_json::to_string(&ActivityType::CleaningReported).unwrap(),
            "\"cleaning_reported\""
        );
    }

    #[test]
    fn role_round_trips_canonical_values() {
        for (role, wire) in [
            (UserRole::Founder, "\"founder\""),
            (UserRole::Manager, "\"manager\""),
            (UserRole::Employee, "\"employee\""),
            (UserRole::Partner, "\"partner\""),
            (UserRole::Individual, "\"individual\""),
        ] {
            assert_eq!(serde_json::to_string(&role).unwrap(), wire);
            assert_eq!(serde_json::from_str::<UserRole>(wire).unwrap(), role);
        }
    }

    #[test]
    fn user_fields_use_client_names() {
        let user = User {
            id: "u1".into(),
            email: "a@b.c".into(),
            full_name: "Ada".into(),
            username: None,
            role: UserRole::Employee,
            team_id: Some("t1".into()),
            created_at: Utc::now(),
            profile_image_url: None,
            fcm_token: None,
            notifications_enabled: true,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("fullName").is_some());
        assert!(json.get("teamId").is_some());
        assert!(json.get("notificationsEnabled").is_some());
        assert!(json.get("username").is_none());
    }
}
