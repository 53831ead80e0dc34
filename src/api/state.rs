use std::sync::Arc;

use crate::auth::{AuthConfig, AuthService};
use crate::config::Settings;
use crate::database::Stores;
use crate::services::{BranchService, ChatService};
use crate::utils::mock_ai::MockResponder;

/// Shared handles for every request handler
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub auth: AuthService,
    pub chats: ChatService,
    pub branches: BranchService,
    pub responder: MockResponder,
}

impl AppState {
    pub fn new(settings: Settings, stores: &Stores) -> Self {
        let auth = AuthService::new(AuthConfig::from(&settings), stores.users.clone());
        let chats = ChatService::new(stores);
        let branches = BranchService::new(chats.clone());
        let responder = MockResponder::new(settings.mock_ai_latency);

        Self {
            settings: Arc::new(settings),
            auth,
            chats,
            branches,
            responder,
        }
    }
}
