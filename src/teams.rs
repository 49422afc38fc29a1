use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use log::{info, warn};
use rand::Rng;
use serde::Deserialize;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::auth::current_user_id;
use crate::error::CoreError;
use crate::identity::IdentityDirectory;
use crate::models::{Activity, ActivityType, Team, User, UserRole};
use crate::store::DocumentStore;

pub const INVITE_CODE_LEN: usize = 6;
const INVITE_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const MAX_CODE_ATTEMPTS: usize = 10;

/// Owns team creation, invite-code allocation and membership mutation.
pub struct TeamRegistry {
    store: Arc<dyn DocumentStore>,
    directory: Arc<IdentityDirectory>,
}

impl TeamRegistry {
    pub fn new(store: Arc<dyn DocumentStore>, directory: Arc<IdentityDirectory>) -> Self {
        TeamRegistry { store, directory }
    }

    /// Creates a team owned by `founder_id` and promotes the founder's
    /// role. The founder must not already belong to a team.
    pub async fn create_team(
        &self,
        name: &str,
        description: &str,
        founder_id: &str,
        occupations: Vec<String>,
    ) -> Result<Team, CoreError> {
        if name.trim().is_empty() {
            return Err(CoreError::Validation("team name must not be empty".into()));
        }

        let founder = self.directory.get_user(founder_id).await?;
        if founder.team_id.is_some() {
            return Err(CoreError::Validation(
                "user already belongs to a team".into(),
            ));
        }
        if founder.role == UserRole::Partner {
            return Err(CoreError::Forbidden(
                "partners cannot create teams".into(),
            ));
        }

        let invite_code = self.allocate_invite_code().await?;
        let team = Team {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            description: description.to_string(),
            founder_id: founder_id.to_string(),
            invite_code,
            members: vec![founder_id.to_string()],
            occupations,
            created_at: Utc::now(),
            logo_url: None,
        };
        self.store.insert_team(&team).await?;

        self.directory
            .set_team(founder_id, Some(team.id.clone()))
            .await?;
        self.directory
            .update_role(founder_id, UserRole::Founder)
            .await?;

        info!("Team created: {} with code {}", team.name, team.invite_code);
        Ok(team)
    }

    /// Joins the team addressed by `code`. Membership append is
    /// idempotent; a partner keeps their role, everyone else becomes an
    /// employee unless an explicit target role is passed.
    pub async fn join_team(
        &self,
        code: &str,
        user_id: &str,
        target_role: Option<UserRole>,
    ) -> Result<Team, CoreError> {
        let normalized = code.trim().to_uppercase();
        let team = self
            .store
            .find_team_by_invite_code(&normalized)
            .await?
            .ok_or(CoreError::InvalidInviteCode)?;

        let user = self.directory.get_user(user_id).await?;
        if let Some(current_team) = &user.team_id {
            if *current_team != team.id {
                return Err(CoreError::Validation(
                    "user already belongs to a team".into(),
                ));
            }
        }

        let appended = self.store.add_team_member(&team.id, user_id).await?;
        self.directory
            .set_team(user_id, Some(team.id.clone()))
            .await?;

        let role = match target_role {
            Some(role) => role,
            None if user.role == UserRole::Partner => UserRole::Partner,
            None => UserRole::Employee,
        };
        if role != user.role {
            self.directory.update_role(user_id, role).await?;
        }

        if appended {
            let activity = Activity {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                team_id: team.id.clone(),
                activity_type: ActivityType::TeamJoined,
                title: "Joined the team".to_string(),
                description: format!("{} joined {}", user.full_name, team.name),
                created_at: Utc::now(),
                related_task_id: None,
            };
            self.store.insert_activity(&activity).await?;
            info!("User {} joined team {} via code", user_id, team.name);
        }

        self.fetch_team(&team.id).await
    }

    pub async fn fetch_team(&self, team_id: &str) -> Result<Team, CoreError> {
        self.store
            .get_team(team_id)
            .await?
            .ok_or(CoreError::NotFound)
    }

    /// Resolves each member id individually, skipping dangling
    /// references left behind by purges.
    pub async fn fetch_members(&self, team_id: &str) -> Result<Vec<User>, CoreError> {
        let team = self.fetch_team(team_id).await?;
        let mut members = Vec::with_capacity(team.members.len());
        for member_id in &team.members {
            match self.directory.get_user(member_id).await {
                Ok(user) => members.push(user),
                Err(CoreError::NotFound) => {
                    warn!("Team {} references missing user {}", team_id, member_id);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(members)
    }

    pub async fn is_member(&self, team_id: &str, user_id: &str) -> Result<bool, CoreError> {
        let team = self.fetch_team(team_id).await?;
        Ok(team.members.iter().any(|m| m == user_id))
    }

    /// Rolls candidate codes until one is unused, capped at
    /// `MAX_CODE_ATTEMPTS` read-before-write checks.
    async fn allocate_invite_code(&self) -> Result<String, CoreError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_invite_code();
            if self.store.find_team_by_invite_code(&code).await?.is_none() {
                return Ok(code);
            }
            warn!("Invite code collision, re-rolling");
        }
        Err(CoreError::CodeSpaceExhausted)
    }
}

fn generate_invite_code() -> String {
    let mut rng = rand::thread_rng();
    (0..INVITE_CODE_LEN)
        .map(|_| INVITE_CODE_ALPHABET[rng.gen_range(0..INVITE_CODE_ALPHABET.len())] as char)
        .collect()
}

// ─── REQUEST PAYLOADS ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub occupations: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct JoinTeamRequest {
    pub invite_code: String,
    pub role: Option<UserRole>,
}

// ─── ENDPOINTS ────────────────────────────────────────────────────────────────

// POST /teams
// The authenticated user becomes the team founder.
pub async fn create_team(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<CreateTeamRequest>,
) -> Result<HttpResponse, CoreError> {
    let current_user = current_user_id(&req)?;
    let payload = payload.into_inner();
    let team = data
        .registry
        .create_team(
            &payload.name,
            &payload.description,
            &current_user,
            payload.occupations,
        )
        .await?;
    Ok(HttpResponse::Ok().json(team))
}

// POST /teams/join
pub async fn join_team(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<JoinTeamRequest>,
) -> Result<HttpResponse, CoreError> {
    let current_user = current_user_id(&req)?;
    let team = data
        .registry
        .join_team(&payload.invite_code, &current_user, payload.role)
        .await?;
    Ok(HttpResponse::Ok().json(team))
}

// GET /teams/{team_id}
// Only members can view team details.
pub async fn get_team(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, CoreError> {
    let current_user = current_user_id(&req)?;
    let team_id = path.into_inner();
    if !data.registry.is_member(&team_id, &current_user).await? {
        return Err(CoreError::Forbidden("not a member of this team".into()));
    }
    let team = data.registry.fetch_team(&team_id).await?;
    Ok(HttpResponse::Ok().json(team))
}

// GET /teams/{team_id}/members
pub async fn get_team_members(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, CoreError> {
    let current_user = current_user_id(&req)?;
    let team_id = path.into_inner();
    if !data.registry.is_member(&team_id, &current_user).await? {
        return Err(CoreError::Forbidden("not a member of this team".into()));
    }
    let members = data.registry.fetch_members(&team_id).await?;
    Ok(HttpResponse::Ok().json(members))
}
