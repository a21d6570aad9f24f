use std::sync::Arc;

use crate::config::Config;
use crate::db::UserStore;
use crate::gatekeeper::BeforeActions;
use crate::session::SessionStore;

/// Application context containing shared dependencies
#[derive(Clone)]
pub struct AppContext {
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub config: Arc<Config>,
    /// Steps run before every request handler
    pub before_actions: Arc<BeforeActions>,
}

impl AppContext {
    /// Creates a context with the standard before-action pipeline
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        config: Arc<Config>,
    ) -> Self {
        Self::with_before_actions(users, sessions, config, BeforeActions::standard())
    }

    pub fn with_before_actions(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        config: Arc<Config>,
        before_actions: BeforeActions,
    ) -> Self {
        Self {
            users,
            sessions,
            config,
            before_actions: Arc::new(before_actions),
        }
    }
}
