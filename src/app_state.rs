use std::sync::Arc;

use crate::auth::AuthService;
use crate::config::Config;
use crate::identity::IdentityDirectory;
use crate::notifications::NotificationCenter;
use crate::partners::PartnerRequestWorkflow;
use crate::store::DocumentStore;
use crate::tasks::TaskLedger;
use crate::teams::TeamRegistry;

/// Shared handler state: the wired service components plus config.
pub struct AppState {
    pub config: Config,
    pub auth: Arc<AuthService>,
    pub directory: Arc<IdentityDirectory>,
    pub registry: Arc<TeamRegistry>,
    pub ledger: Arc<TaskLedger>,
    pub workflow: Arc<PartnerRequestWorkflow>,
    pub notifications: Arc<NotificationCenter>,
}

impl AppState {
    /// Composition root: constructs every component over one shared
    /// store. Lifecycle is owned by the caller (the binary entry point
    /// or a test harness), not by ambient statics.
    pub fn build(store: Arc<dyn DocumentStore>, config: Config) -> Self {
        let directory = Arc::new(IdentityDirectory::new(store.clone()));
        let registry = Arc::new(TeamRegistry::new(store.clone(), directory.clone()));
        let notifications = Arc::new(NotificationCenter::new(store.clone(), directory.clone()));
        let ledger = Arc::new(TaskLedger::new(
            store.clone(),
            registry.clone(),
            notifications.clone(),
        ));
        let workflow = Arc::new(PartnerRequestWorkflow::new(
            store.clone(),
            directory.clone(),
            registry.clone(),
            ledger.clone(),
        ));
        let auth = Arc::new(AuthService::new(
            store,
            directory.clone(),
            config.jwt_secret.clone(),
        ));

        AppState {
            config,
            auth,
            directory,
            registry,
            ledger,
            workflow,
            notifications,
        }
    }
}
