use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use mongodb::bson::{doc, to_bson, Document};
use mongodb::{options::ClientOptions, Client, Collection, Cursor, Database};
use serde::de::DeserializeOwned;

use super::{DocumentStore, PartnerReview, StoreError, UserPatch};
use crate::models::{
    Activity, CleaningStatus, Credential, Notification, PartnerRequest, Task, TaskStatus, Team,
    User,
};

mod collections {
    pub const USERS: &str = "users";
    pub const CREDENTIALS: &str = "credentials";
    pub const TEAMS: &str = "teams";
    pub const TASKS: &str = "tasks";
    pub const ACTIVITIES: &str = "activities";
    pub const CLEANING_STATUS: &str = "cleaning_status";
    pub const PARTNER_REQUESTS: &str = "partner_requests";
    pub const NOTIFICATIONS: &str = "notifications";
}

pub struct MongoStore {
    pub client: Client,
    pub db: Database,
}

impl MongoStore {
    pub async fn init(uri: &str, db_name: &str) -> Result<Self, StoreError> {
        let client_options = ClientOptions::parse(uri).await?;
        let client = Client::with_options(client_options)?;
        let db = client.database(db_name);
        Ok(MongoStore { client, db })
    }

    fn users(&self) -> Collection<User> {
        self.db.collection(collections::USERS)
    }

    fn credentials(&self) -> Collection<Credential> {
        self.db.collection(collections::CREDENTIALS)
    }

    fn teams(&self) -> Collection<Team> {
        self.db.collection(collections::TEAMS)
    }

    fn tasks(&self) -> Collection<Task> {
        self.db.collection(collections::TASKS)
    }

    fn activities(&self) -> Collection<Activity> {
        self.db.collection(collections::ACTIVITIES)
    }

    fn cleaning(&self) -> Collection<CleaningStatus> {
        self.db.collection(collections::CLEANING_STATUS)
    }

    fn partner_requests(&self) -> Collection<PartnerRequest> {
        self.db.collection(collections::PARTNER_REQUESTS)
    }

    fn notifications(&self) -> Collection<Notification> {
        self.db.collection(collections::NOTIFICATIONS)
    }
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for StoreError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

async fn drain<T: DeserializeOwned + Send + Sync + Unpin>(
    mut cursor: Cursor<T>,
) -> Result<Vec<T>, StoreError> {
    let mut items = Vec::new();
    while let Some(item) = cursor.next().await {
        items.push(item?);
    }
    Ok(items)
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        self.users().insert_one(user).await?;
        Ok(())
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users().find_one(doc! { "_id": id }).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users().find_one(doc! { "email": email }).await?)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users().find_one(doc! { "username": username }).await?)
    }

    async fn update_user(&self, id: &str, patch: UserPatch) -> Result<bool, StoreError> {
        let mut set = Document::new();
        let mut unset = Document::new();

        if let Some(full_name) = patch.full_name {
            set.insert("fullName", full_name);
        }
        if let Some(username) = patch.username {
            set.insert("username", username);
        }
        if let Some(role) = patch.role {
            set.insert("role", to_bson(&role)?);
        }
        match patch.team_id {
            Some(Some(team_id)) => {
                set.insert("teamId", team_id);
            }
            Some(None) => {
                unset.insert("teamId", "");
            }
            None => {}
        }
        match patch.fcm_token {
            Some(Some(token)) => {
                set.insert("fcmToken", token);
            }
            Some(None) => {
                unset.insert("fcmToken", "");
            }
            None => {}
        }
        if let Some(enabled) = patch.notifications_enabled {
            set.insert("notificationsEnabled", enabled);
        }

        let mut update = Document::new();
        if !set.is_empty() {
            update.insert("$set", set);
        }
        if !unset.is_empty() {
            update.insert("$unset", unset);
        }
        if update.is_empty() {
            return Ok(self.get_user(id).await?.is_some());
        }

        let result = self.users().update_one(doc! { "_id": id }, update).await?;
        Ok(result.matched_count == 1)
    }

    async fn delete_user(&self, id: &str) -> Result<(), StoreError> {
        self.users().delete_one(doc! { "_id": id }).await?;
        Ok(())
    }

    async fn insert_credential(&self, credential: &Credential) -> Result<(), StoreError> {
        self.credentials().insert_one(credential).await?;
        Ok(())
    }

    async fn find_credential_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Credential>, StoreError> {
        Ok(self.credentials().find_one(doc! { "email": email }).await?)
    }

    async fn delete_credential(&self, user_id: &str) -> Result<(), StoreError> {
        self.credentials().delete_one(doc! { "_id": user_id }).await?;
        Ok(())
    }

    async fn insert_team(&self, team: &Team) -> Result<(), StoreError> {
        self.teams().insert_one(team).await?;
        Ok(())
    }

    async fn get_team(&self, id: &str) -> Result<Option<Team>, StoreError> {
        Ok(self.teams().find_one(doc! { "_id": id }).await?)
    }

    async fn find_team_by_invite_code(&self, code: &str) -> Result<Option<Team>, StoreError> {
        Ok(self.teams().find_one(doc! { "inviteCode": code }).await?)
    }

    async fn add_team_member(&self, team_id: &str, user_id: &str) -> Result<bool, StoreError> {
        let result = self
            .teams()
            .update_one(
                doc! { "_id": team_id },
                doc! { "$addToSet": { "members": user_id } },
            )
            .await?;
        Ok(result.modified_count == 1)
    }

    async fn remove_team_member(&self, team_id: &str, user_id: &str) -> Result<(), StoreError> {
        self.teams()
            .update_one(
                doc! { "_id": team_id },
                doc! { "$pull": { "members": user_id } },
            )
            .await?;
        Ok(())
    }

    async fn insert_task(&self, task: &Task) -> Result<(), StoreError> {
        self.tasks().insert_one(task).await?;
        Ok(())
    }

    async fn get_task(&self, id: &str) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks().find_one(doc! { "_id": id }).await?)
    }

    async fn set_task_status(
        &self,
        id: &str,
        status: TaskStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<bool, StoreError> {
        let update = match completed_at {
            Some(at) => doc! {
                "$set": { "status": to_bson(&status)?, "completedAt": to_bson(&at)? },
            },
            None => doc! {
                "$set": { "status": to_bson(&status)? },
                "$unset": { "completedAt": "" },
            },
        };
        let result = self.tasks().update_one(doc! { "_id": id }, update).await?;
        Ok(result.matched_count == 1)
    }

    async fn list_tasks_for_user(&self, user_id: &str) -> Result<Vec<Task>, StoreError> {
        let cursor = self
            .tasks()
            .find(doc! { "assignedTo": user_id })
            .sort(doc! { "createdAt": -1 })
            .await?;
        drain(cursor).await
    }

    async fn list_tasks_for_team(&self, team_id: &str) -> Result<Vec<Task>, StoreError> {
        let cursor = self
            .tasks()
            .find(doc! { "teamId": team_id })
            .sort(doc! { "createdAt": -1 })
            .await?;
        drain(cursor).await
    }

    async fn delete_tasks_for_user(&self, user_id: &str) -> Result<u64, StoreError> {
        let filter = doc! {
            "$or": [ { "assignedTo": user_id }, { "assignedBy": user_id } ],
        };
        let result = self.tasks().delete_many(filter).await?;
        Ok(result.deleted_count)
    }

    async fn insert_activity(&self, activity: &Activity) -> Result<(), StoreError> {
        self.activities().insert_one(activity).await?;
        Ok(())
    }

    async fn list_activities_for_team(&self, team_id: &str) -> Result<Vec<Activity>, StoreError> {
        let cursor = self
            .activities()
            .find(doc! { "teamId": team_id })
            .sort(doc! { "createdAt": -1 })
            .await?;
        drain(cursor).await
    }

    async fn delete_activities_for_user(&self, user_id: &str) -> Result<u64, StoreError> {
        let result = self
            .activities()
            .delete_many(doc! { "userId": user_id })
            .await?;
        Ok(result.deleted_count)
    }

    async fn insert_cleaning_status(&self, status: &CleaningStatus) -> Result<(), StoreError> {
        self.cleaning().insert_one(status).await?;
        Ok(())
    }

    async fn list_cleaning_for_team(
        &self,
        team_id: &str,
    ) -> Result<Vec<CleaningStatus>, StoreError> {
        let cursor = self
            .cleaning()
            .find(doc! { "teamId": team_id })
            .sort(doc! { "reportedAt": -1 })
            .await?;
        drain(cursor).await
    }

    async fn insert_partner_request(&self, request: &PartnerRequest) -> Result<(), StoreError> {
        self.partner_requests().insert_one(request).await?;
        Ok(())
    }

    async fn get_partner_request(&self, id: &str) -> Result<Option<PartnerRequest>, StoreError> {
        Ok(self.partner_requests().find_one(doc! { "_id": id }).await?)
    }

    async fn apply_partner_review(
        &self,
        id: &str,
        review: &PartnerReview,
    ) -> Result<bool, StoreError> {
        let mut set = doc! {
            "status": to_bson(&review.status)?,
            "reviewedBy": &review.reviewed_by,
            "reviewedAt": to_bson(&review.reviewed_at)?,
        };
        if let Some(assigned_to) = &review.assigned_to {
            set.insert("assignedTo", assigned_to);
        }
        let result = self
            .partner_requests()
            .update_one(doc! { "_id": id }, doc! { "$set": set })
            .await?;
        Ok(result.matched_count == 1)
    }

    async fn list_partner_requests_for_team(
        &self,
        team_id: &str,
    ) -> Result<Vec<PartnerRequest>, StoreError> {
        let cursor = self
            .partner_requests()
            .find(doc! { "teamId": team_id })
            .sort(doc! { "createdAt": -1 })
            .await?;
        drain(cursor).await
    }

    async fn list_partner_requests_for_partner(
        &self,
        partner_id: &str,
    ) -> Result<Vec<PartnerRequest>, StoreError> {
        let cursor = self
            .partner_requests()
            .find(doc! { "partnerId": partner_id })
            .sort(doc! { "createdAt": -1 })
            .await?;
        drain(cursor).await
    }

    async fn delete_partner_requests_for_partner(
        &self,
        partner_id: &str,
    ) -> Result<u64, StoreError> {
        let result = self
            .partner_requests()
            .delete_many(doc! { "partnerId": partner_id })
            .await?;
        Ok(result.deleted_count)
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<(), StoreError> {
        self.notifications().insert_one(notification).await?;
        Ok(())
    }

    async fn list_notifications_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Notification>, StoreError> {
        let cursor = self
            .notifications()
            .find(doc! { "userId": user_id })
            .sort(doc! { "createdAt": -1 })
            .limit(limit as i64)
            .await?;
        drain(cursor).await
    }

    async fn mark_notification_read(&self, id: &str) -> Result<bool, StoreError> {
        let result = self
            .notifications()
            .update_one(doc! { "_id": id }, doc! { "$set": { "isRead": true } })
            .await?;
        Ok(result.matched_count == 1)
    }

    async fn mark_all_notifications_read(&self, user_id: &str) -> Result<u64, StoreError> {
        let result = self
            .notifications()
            .update_many(
                doc! { "userId": user_id, "isRead": false },
                doc! { "$set": { "isRead": true } },
            )
            .await?;
        Ok(result.modified_count)
    }

    async fn delete_notification(&self, id: &str) -> Result<bool, StoreError> {
        let result = self.notifications().delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count == 1)
    }

    async fn delete_notifications_for_user(&self, user_id: &str) -> Result<u64, StoreError> {
        let result = self
            .notifications()
            .delete_many(doc! { "userId": user_id })
            .await?;
        Ok(result.deleted_count)
    }
}
