use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::chat::Chat;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateBranchRequest {
    pub chat_id: Uuid,
    pub response_id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BranchResponse {
    pub id: Uuid,
    pub name: String,
    pub parent_chat_id: Uuid,
    pub parent_response_id: String,
    pub created_at: DateTime<Utc>,
}

impl BranchResponse {
    /// Listing entry; the originating response is not tracked on the branch itself
    pub fn from_listing(chat: &Chat, parent_chat_id: Uuid) -> Self {
        Self {
            id: chat.id,
            name: chat.name.clone(),
            parent_chat_id,
            parent_response_id: String::new(),
            created_at: chat.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BranchTreeNode {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub children: Vec<BranchTreeNode>,
}

impl BranchTreeNode {
    pub fn depth(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(BranchTreeNode::depth)
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BranchTreeResponse {
    pub root_id: Uuid,
    pub tree: BranchTreeNode,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SetActiveBranchQuery {
    pub chat_id: Uuid,
    pub branch_id: Uuid,
}
