// Not every test binary uses every helper here.
#![allow(dead_code)]

use std::sync::Arc;

use base_of_office::app_state::AppState;
use base_of_office::config::Config;
use base_of_office::models::{Team, User, UserRole};
use base_of_office::store::MemoryStore;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret";

pub fn test_config() -> Config {
    Config {
        mongo_uri: "mongodb://unused".to_string(),
        database_name: "test".to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        frontend_origin: "http://localhost:3000".to_string(),
        use_memory_store: true,
    }
}

/// Wires the full component graph over an in-memory store.
pub struct TestContext {
    pub state: AppState,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        TestContext {
            state: AppState::build(store, test_config()),
        }
    }

    #[allow(dead_code)]
    pub async fn seed_user(&self, full_name: &str, role: UserRole) -> User {
        let email = format!("{}@test.com", Uuid::new_v4());
        self.state
            .directory
            .create_user(&email, full_name, role, None)
            .await
            .expect("failed to seed user")
    }

    /// Seeds a founder and a team they own.
    #[allow(dead_code)]
    pub async fn seed_team(&self, name: &str) -> (User, Team) {
        let founder = self.seed_user("Founder", UserRole::Founder).await;
        let team = self
            .state
            .registry
            .create_team(name, "", &founder.id, Vec::new())
            .await
            .expect("failed to seed team");
        let founder = self
            .state
            .directory
            .get_user(&founder.id)
            .await
            .expect("failed to reload founder");
        (founder, team)
    }

    /// Seeds a user and joins them to the team by its invite code.
    #[allow(dead_code)]
    pub async fn seed_member(&self, team: &Team, full_name: &str) -> User {
        let user = self.seed_user(full_name, UserRole::Individual).await;
        self.state
            .registry
            .join_team(&team.invite_code, &user.id, None)
            .await
            .expect("failed to join team");
        self.state
            .directory
            .get_user(&user.id)
            .await
            .expect("failed to reload member")
    }
}
