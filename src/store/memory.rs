use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::{DocumentStore, PartnerReview, StoreError, UserPatch};
use crate::models::{
    Activity, CleaningStatus, Credential, Notification, PartnerRequest, Task, TaskStatus, Team,
    User,
};

/// In-memory implementation of the document store, used for the local
/// demo mode and the test suite. One async mutex per collection mirrors
/// the per-document atomicity of the real store.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<String, User>>,
    credentials: Mutex<HashMap<String, Credential>>,
    teams: Mutex<HashMap<String, Team>>,
    tasks: Mutex<HashMap<String, Task>>,
    activities: Mutex<HashMap<String, Activity>>,
    cleaning: Mutex<HashMap<String, CleaningStatus>>,
    partner_requests: Mutex<HashMap<String, PartnerRequest>>,
    notifications: Mutex<HashMap<String, Notification>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T, F>(mut items: Vec<T>, created_at: F) -> Vec<T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    items
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        self.users
            .lock()
            .await
            .insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().await.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|u| u.username.as_deref() == Some(username))
            .cloned())
    }

    async fn update_user(&self, id: &str, patch: UserPatch) -> Result<bool, StoreError> {
        let mut users = self.users.lock().await;
        let Some(user) = users.get_mut(id) else {
            return Ok(false);
        };
        if let Some(full_name) = patch.full_name {
            user.full_name = full_name;
        }
        if let Some(username) = patch.username {
            user.username = Some(username);
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        if let Some(team_id) = patch.team_id {
            user.team_id = team_id;
        }
        if let Some(fcm_token) = patch.fcm_token {
            user.fcm_token = fcm_token;
        }
        if let Some(enabled) = patch.notifications_enabled {
            user.notifications_enabled = enabled;
        }
        Ok(true)
    }

    async fn delete_user(&self, id: &str) -> Result<(), StoreError> {
        self.users.lock().await.remove(id);
        Ok(())
    }

    async fn insert_credential(&self, credential: &Credential) -> Result<(), StoreError> {
        self.credentials
            .lock()
            .await
            .insert(credential.user_id.clone(), credential.clone());
        Ok(())
    }

    async fn find_credential_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Credential>, StoreError> {
        Ok(self
            .credentials
            .lock()
            .await
            .values()
            .find(|c| c.email == email)
            .cloned())
    }

    async fn delete_credential(&self, user_id: &str) -> Result<(), StoreError> {
        self.credentials.lock().await.remove(user_id);
        Ok(())
    }

    async fn insert_team(&self, team: &Team) -> Result<(), StoreError> {
        self.teams
            .lock()
            .await
            .insert(team.id.clone(), team.clone());
        Ok(())
    }

    async fn get_team(&self, id: &str) -> Result<Option<Team>, StoreError> {
        Ok(self.teams.lock().await.get(id).cloned())
    }

    async fn find_team_by_invite_code(&self, code: &str) -> Result<Option<Team>, StoreError> {
        Ok(self
            .teams
            .lock()
            .await
            .values()
            .find(|t| t.invite_code == code)
            .cloned())
    }

    async fn add_team_member(&self, team_id: &str, user_id: &str) -> Result<bool, StoreError> {
        let mut teams = self.teams.lock().await;
        let Some(team) = teams.get_mut(team_id) else {
            return Ok(false);
        };
        if team.members.iter().any(|m| m == user_id) {
            return Ok(false);
        }
        team.members.push(user_id.to_string());
        Ok(true)
    }

    async fn remove_team_member(&self, team_id: &str, user_id: &str) -> Result<(), StoreError> {
        if let Some(team) = self.teams.lock().await.get_mut(team_id) {
            team.members.retain(|m| m != user_id);
        }
        Ok(())
    }

    async fn insert_task(&self, task: &Task) -> Result<(), StoreError> {
        self.tasks
            .lock()
            .await
            .insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn get_task(&self, id: &str) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.lock().await.get(id).cloned())
    }

    async fn set_task_status(
        &self,
        id: &str,
        status: TaskStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<bool, StoreError> {
        let mut tasks = self.tasks.lock().await;
        let Some(task) = tasks.get_mut(id) else {
            return Ok(false);
        };
        task.status = status;
        task.completed_at = completed_at;
        Ok(true)
    }

    async fn list_tasks_for_user(&self, user_id: &str) -> Result<Vec<Task>, StoreError> {
        let tasks: Vec<Task> = self
            .tasks
            .lock()
            .await
            .values()
            .filter(|t| t.assigned_to == user_id)
            .cloned()
            .collect();
        Ok(newest_first(tasks, |t| t.created_at))
    }

    async fn list_tasks_for_team(&self, team_id: &str) -> Result<Vec<Task>, StoreError> {
        let tasks: Vec<Task> = self
            .tasks
            .lock()
            .await
            .values()
            .filter(|t| t.team_id == team_id)
            .cloned()
            .collect();
        Ok(newest_first(tasks, |t| t.created_at))
    }

    async fn delete_tasks_for_user(&self, user_id: &str) -> Result<u64, StoreError> {
        let mut tasks = self.tasks.lock().await;
        let before = tasks.len();
        tasks.retain(|_, t| t.assigned_to != user_id && t.assigned_by != user_id);
        Ok((before - tasks.len()) as u64)
    }

    async fn insert_activity(&self, activity: &Activity) -> Result<(), StoreError> {
        self.activities
            .lock()
            .await
            .insert(activity.id.clone(), activity.clone());
        Ok(())
    }

    async fn list_activities_for_team(&self, team_id: &str) -> Result<Vec<Activity>, StoreError> {
        let activities: Vec<Activity> = self
            .activities
            .lock()
            .await
            .values()
            .filter(|a| a.team_id == team_id)
            .cloned()
            .collect();
        Ok(newest_first(activities, |a| a.created_at))
    }

    async fn delete_activities_for_user(&self, user_id: &str) -> Result<u64, StoreError> {
        let mut activities = self.activities.lock().await;
        let before = activities.len();
        activities.retain(|_, a| a.user_id != user_id);
        Ok((before - activities.len()) as u64)
    }

    async fn insert_cleaning_status(&self, status: &CleaningStatus) -> Result<(), StoreError> {
        self.cleaning
            .lock()
            .await
            .insert(status.id.clone(), status.clone());
        Ok(())
    }

    async fn list_cleaning_for_team(
        &self,
        team_id: &str,
    ) -> Result<Vec<CleaningStatus>, StoreError> {
        let reports: Vec<CleaningStatus> = self
            .cleaning
            .lock()
            .await
            .values()
            .filter(|c| c.team_id == team_id)
            .cloned()
            .collect();
        Ok(newest_first(reports, |c| c.reported_at))
    }

    async fn insert_partner_request(&self, request: &PartnerRequest) -> Result<(), StoreError> {
        self.partner_requests
            .lock()
            .await
            .insert(request.id.clone(), request.clone());
        Ok(())
    }

    async fn get_partner_request(&self, id: &str) -> Result<Option<PartnerRequest>, StoreError> {
        Ok(self.partner_requests.lock().await.get(id).cloned())
    }

    async fn apply_partner_review(
        &self,
        id: &str,
        review: &PartnerReview,
    ) -> Result<bool, StoreError> {
        let mut requests = self.partner_requests.lock().await;
        let Some(request) = requests.get_mut(id) else {
            return Ok(false);
        };
        request.status = review.status;
        request.reviewed_by = Some(review.reviewed_by.clone());
        request.reviewed_at = Some(review.reviewed_at);
        if review.assigned_to.is_some() {
            request.assigned_to = review.assigned_to.clone();
        }
        Ok(true)
    }

    async fn list_partner_requests_for_team(
        &self,
        team_id: &str,
    ) -> Result<Vec<PartnerRequest>, StoreError> {
        let requests: Vec<PartnerRequest> = self
            .partner_requests
            .lock()
            .await
            .values()
            .filter(|r| r.team_id == team_id)
            .cloned()
            .collect();
        Ok(newest_first(requests, |r| r.created_at))
    }

    async fn list_partner_requests_for_partner(
        &self,
        partner_id: &str,
    ) -> Result<Vec<PartnerRequest>, StoreError> {
        let requests: Vec<PartnerRequest> = self
            .partner_requests
            .lock()
            .await
            .values()
            .filter(|r| r.partner_id == partner_id)
            .cloned()
            .collect();
        Ok(newest_first(requests, |r| r.created_at))
    }

    async fn delete_partner_requests_for_partner(
        &self,
        partner_id: &str,
    ) -> Result<u64, StoreError> {
        let mut requests = self.partner_requests.lock().await;
        let before = requests.len();
        requests.retain(|_, r| r.partner_id != partner_id);
        Ok((before - requests.len()) as u64)
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<(), StoreError> {
        self.notifications
            .lock()
            .await
            .insert(notification.id.clone(), notification.clone());
        Ok(())
    }

    async fn list_notifications_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Notification>, StoreError> {
        let notifications: Vec<Notification> = self
            .notifications
            .lock()
            .await
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        let mut notifications = newest_first(notifications, |n| n.created_at);
        notifications.truncate(limit);
        Ok(notifications)
    }

    async fn mark_notification_read(&self, id: &str) -> Result<bool, StoreError> {
        let mut notifications = self.notifications.lock().await;
        let Some(notification) = notifications.get_mut(id) else {
            return Ok(false);
        };
        notification.is_read = true;
        Ok(true)
    }

    async fn mark_all_notifications_read(&self, user_id: &str) -> Result<u64, StoreError> {
        let mut notifications = self.notifications.lock().await;
        let mut updated = 0;
        for notification in notifications.values_mut() {
            if notification.user_id == user_id && !notification.is_read {
                notification.is_read = true;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete_notification(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.notifications.lock().await.remove(id).is_some())
    }

    async fn delete_notifications_for_user(&self, user_id: &str) -> Result<u64, StoreError> {
        let mut notifications = self.notifications.lock().await;
        let before = notifications.len();
        notifications.retain(|_, n| n.user_id != user_id);
        Ok((before - notifications.len()) as u64)
    }
}
