//! Conversation branching.
//!
//! A branch is an ordinary chat of type `branch`, seeded with a copy of the
//! exchange it was forked from. The link back lives on the originating QA
//! pair, so the tree of branches is rebuilt by walking chat documents.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

use super::chat_service::ChatService;
use super::errors::{ServiceError, ServiceResult};
use crate::database::models::{BranchTreeNode, Chat, ChatType, NewConversation};

/// Result of a successful branch creation
#[derive(Debug, Clone)]
pub struct CreatedBranch {
    pub chat: Chat,
    pub parent_chat_id: Uuid,
    pub parent_response_id: String,
    pub created_at: DateTime<Utc>,
}

/// Outcome of pointing a chat at one of its branches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveBranchUpdate {
    Updated,
    /// The document was not modified, either already active or lost to a concurrent write
    Unchanged,
}

#[derive(Clone)]
pub struct BranchService {
    chats: ChatService,
}

impl BranchService {
    pub fn new(chats: ChatService) -> Self {
        Self { chats }
    }

    /// Fork a new chat from the answer `response_id` of `chat_id`
    pub async fn create_branch(
        &self,
        chat_id: Uuid,
        response_id: &str,
        user_id: Uuid,
        name: Option<String>,
    ) -> ServiceResult<CreatedBranch> {
        let parent = self.chats.get_chat(chat_id).await?;
        let origin = self
            .chats
            .find_qa_pair(chat_id, response_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Response not found"))?;

        let name = name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| format!("Branch of {}", parent.name));

        let branch = self
            .chats
            .create_chat(user_id, &name, ChatType::Branch)
            .await?;

        let mut linked = false;
        let result: ServiceResult<()> = async {
            self.chats
                .record_conversation(NewConversation {
                    chat_id: branch.id,
                    account_id: user_id,
                    name: name.clone(),
                    parent_id: None,
                })
                .await?;

            self.chats
                .link_branch(chat_id, response_id, branch.id)
                .await?;
            linked = true;

            self.chats.append_pair(branch.id, origin.duplicate()).await
        }
        .await;

        if let Err(e) = result {
            tracing::error!(
                "Creating branch {} from chat {} failed: {}",
                branch.id,
                chat_id,
                e
            );
            self.compensate_branch(chat_id, response_id, branch.id, linked)
                .await;
            return Err(e);
        }

        tracing::info!("Created branch {} from chat {}", branch.id, chat_id);
        Ok(CreatedBranch {
            created_at: branch.created_at,
            chat: branch,
            parent_chat_id: chat_id,
            parent_response_id: response_id.to_string(),
        })
    }

    /// Undo the steps of a failed branch creation, newest first
    async fn compensate_branch(
        &self,
        chat_id: Uuid,
        response_id: &str,
        branch_id: Uuid,
        linked: bool,
    ) {
        if linked {
            match self.chats.unlink_branch(chat_id, response_id, branch_id).await {
                Ok(true) => {}
                Ok(false) => tracing::warn!(
                    "Branch {} was not linked on response {} during rollback",
                    branch_id,
                    response_id
                ),
                Err(e) => tracing::error!("Failed to unlink branch {}: {}", branch_id, e),
            }
        }
        self.chats.discard_chat(branch_id).await;
    }

    /// Distinct chats branched from any answer of `chat_id`
    pub async fn get_branches(&self, chat_id: Uuid) -> ServiceResult<Vec<Chat>> {
        self.chats.get_chat(chat_id).await?;
        self.resolve_branches(chat_id).await
    }

    // First-seen order; ids that no longer resolve to a chat are skipped
    async fn resolve_branches(&self, chat_id: Uuid) -> ServiceResult<Vec<Chat>> {
        let Some(document) = self.chats.get_document(chat_id).await? else {
            return Ok(Vec::new());
        };

        let mut seen = HashSet::new();
        let mut branches = Vec::new();
        for branch_id in document.branch_ids() {
            if !seen.insert(branch_id) {
                continue;
            }
            match self.chats.get_chat(branch_id).await {
                Ok(chat) => branches.push(chat),
                Err(ServiceError::NotFound(_)) => {
                    tracing::debug!("Skipping dangling branch {} of chat {}", branch_id, chat_id)
                }
                Err(e) => return Err(e),
            }
        }

        Ok(branches)
    }

    /// Rebuild the tree of branches rooted at `chat_id`.
    ///
    /// Each chat appears at most once; a reference back to a chat already in
    /// the tree is dropped.
    pub async fn build_branch_tree(&self, chat_id: Uuid) -> ServiceResult<BranchTreeNode> {
        let root = self.chats.get_chat(chat_id).await?;

        let mut arena = vec![TreeSlot {
            id: root.id,
            name: root.name,
            parent_id: None,
            children: Vec::new(),
        }];
        let mut visited = HashSet::from([root.id]);
        let mut stack = vec![0usize];

        while let Some(index) = stack.pop() {
            let node_id = arena[index].id;
            for child in self.resolve_branches(node_id).await? {
                if !visited.insert(child.id) {
                    tracing::warn!(
                        "Branch {} is referenced more than once under chat {}, skipping",
                        child.id,
                        chat_id
                    );
                    continue;
                }

                let child_index = arena.len();
                arena.push(TreeSlot {
                    id: child.id,
                    name: child.name,
                    parent_id: Some(node_id),
                    children: Vec::new(),
                });
                arena[index].children.push(child_index);
                stack.push(child_index);
            }
        }

        assemble_tree(arena)
            .ok_or_else(|| ServiceError::Internal("Branch tree has no root".to_string()))
    }

    /// Mark `branch_id` as the active branch of `chat_id`
    pub async fn set_active_branch(
        &self,
        chat_id: Uuid,
        branch_id: Uuid,
    ) -> ServiceResult<ActiveBranchUpdate> {
        self.chats.get_chat(chat_id).await?;

        let branches = self.resolve_branches(chat_id).await?;
        if !branches.iter().any(|branch| branch.id == branch_id) {
            return Err(ServiceError::not_found("Branch not found for this chat"));
        }

        if self.chats.set_active_branch_id(chat_id, branch_id).await? {
            tracing::debug!("Chat {} now points at branch {}", chat_id, branch_id);
            Ok(ActiveBranchUpdate::Updated)
        } else {
            Ok(ActiveBranchUpdate::Unchanged)
        }
    }
}

struct TreeSlot {
    id: Uuid,
    name: String,
    parent_id: Option<Uuid>,
    children: Vec<usize>,
}

// Children always sit at higher indices than their parent, so folding from
// the back finishes every subtree before its parent needs it.
fn assemble_tree(arena: Vec<TreeSlot>) -> Option<BranchTreeNode> {
    let mut built: Vec<Option<BranchTreeNode>> = Vec::with_capacity(arena.len());
    built.resize_with(arena.len(), || None);

    for (index, slot) in arena.into_iter().enumerate().rev() {
        let children = slot
            .children
            .iter()
            .filter_map(|child| built[*child].take())
            .collect();
        built[index] = Some(BranchTreeNode {
            id: slot.id,
            name: slot.name,
            parent_id: slot.parent_id,
            children,
        });
    }

    built.into_iter().next().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryContentStore;
    use crate::database::models::{ChatDocument, QaPair};
    use crate::database::store::{ContentStore, StoreResult};
    use crate::database::Stores;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct Fixture {
        chats: ChatService,
        branches: BranchService,
        owner: Uuid,
    }

    fn fixture_with(stores: Stores) -> Fixture {
        let chats = ChatService::new(&stores);
        Fixture {
            branches: BranchService::new(chats.clone()),
            chats,
            owner: Uuid::new_v4(),
        }
    }

    fn fixture() -> Fixture {
        fixture_with(Stores::in_memory())
    }

    impl Fixture {
        async fn chat_with_answer(&self, name: &str) -> (Chat, QaPair) {
            let chat = self
                .chats
                .create_chat(self.owner, name, ChatType::Personal)
                .await
                .unwrap();
            let pair = self
                .chats
                .add_message(
                    chat.id,
                    "hello",
                    "Hello! How can I help you today?",
                    Some(serde_json::json!({"source": "mock_ai"})),
                )
                .await
                .unwrap();
            (chat, pair)
        }

        async fn branch(&self, chat_id: Uuid, response_id: &str, name: &str) -> Chat {
            self.branches
                .create_branch(chat_id, response_id, self.owner, Some(name.to_string()))
                .await
                .unwrap()
                .chat
        }

        async fn first_pair(&self, chat_id: Uuid) -> QaPair {
            self.chats.get_chat_with_content(chat_id).await.unwrap().qa_pairs[0].clone()
        }
    }

    #[tokio::test]
    async fn test_create_branch_links_and_copies_origin() {
        let fx = fixture();
        let (chat, origin) = fx.chat_with_answer("Trip Planning").await;

        let created = fx
            .branches
            .create_branch(chat.id, &origin.response_id, fx.owner, Some("Alt Plan".into()))
            .await
            .unwrap();
        assert_eq!(created.chat.name, "Alt Plan");
        assert_eq!(created.chat.chat_type, ChatType::Branch);
        assert_eq!(created.parent_chat_id, chat.id);
        assert_eq!(created.parent_response_id, origin.response_id);

        let linked = fx.first_pair(chat.id).await;
        assert_eq!(linked.branches, vec![created.chat.id]);

        let copied = fx.first_pair(created.chat.id).await;
        assert_eq!(copied.question, origin.question);
        assert_eq!(copied.response, origin.response);
        assert_eq!(copied.metadata, origin.metadata);
        assert_ne!(copied.response_id, origin.response_id);

        let conversations = fx.chats.list_conversations(created.chat.id).await.unwrap();
        assert_eq!(conversations.len(), 1);
        assert!(conversations[0].parent_id.is_none());
    }

    #[tokio::test]
    async fn test_create_branch_default_name() {
        let fx = fixture();
        let (chat, origin) = fx.chat_with_answer("Trip Planning").await;

        let created = fx
            .branches
            .create_branch(chat.id, &origin.response_id, fx.owner, None)
            .await
            .unwrap();
        assert_eq!(created.chat.name, "Branch of Trip Planning");
    }

    #[tokio::test]
    async fn test_default_name_of_long_named_chat_is_kept_whole() {
        let fx = fixture();
        let long_name = "n".repeat(300);
        let (chat, origin) = fx.chat_with_answer(&long_name).await;

        let created = fx
            .branches
            .create_branch(chat.id, &origin.response_id, fx.owner, None)
            .await
            .unwrap();
        assert_eq!(created.chat.name, format!("Branch of {}", long_name));

        let conversations = fx.chats.list_conversations(created.chat.id).await.unwrap();
        assert_eq!(conversations[0].name, created.chat.name);
    }

    #[tokio::test]
    async fn test_create_branch_missing_inputs() {
        let fx = fixture();
        let (chat, _) = fx.chat_with_answer("Chat").await;

        let err = fx
            .branches
            .create_branch(Uuid::new_v4(), "whatever", fx.owner, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref m) if m == "Chat not found"));

        let err = fx
            .branches
            .create_branch(chat.id, "missing", fx.owner, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref m) if m == "Response not found"));

        // Nothing but the original chat was created
        assert_eq!(fx.chats.list_user_chats(fx.owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_branches_empty_without_branches() {
        let fx = fixture();
        let (chat, _) = fx.chat_with_answer("Chat").await;
        assert!(fx.branches.get_branches(chat.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_branches_dedupes_and_skips_dangling() {
        let fx = fixture();
        let (chat, origin) = fx.chat_with_answer("Chat").await;
        let first = fx.branch(chat.id, &origin.response_id, "B1").await;
        let second = fx.branch(chat.id, &origin.response_id, "B2").await;

        // Duplicate reference plus an id that resolves to nothing
        fx.chats
            .link_branch(chat.id, &origin.response_id, first.id)
            .await
            .unwrap();
        fx.chats
            .link_branch(chat.id, &origin.response_id, Uuid::new_v4())
            .await
            .unwrap();

        let ids: Vec<Uuid> = fx
            .branches
            .get_branches(chat.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn test_get_branches_unknown_chat() {
        let err = fixture()
            .branches
            .get_branches(Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_branch_tree_depth_three() {
        let fx = fixture();
        let (root, origin) = fx.chat_with_answer("Root").await;
        let b1 = fx.branch(root.id, &origin.response_id, "B1").await;
        let b2 = fx.branch(root.id, &origin.response_id, "B2").await;

        let b2_pair = fx.first_pair(b2.id).await;
        let b3 = fx.branch(b2.id, &b2_pair.response_id, "B3").await;

        let tree = fx.branches.build_branch_tree(root.id).await.unwrap();
        assert_eq!(tree.id, root.id);
        assert_eq!(tree.name, "Root");
        assert!(tree.parent_id.is_none());
        assert_eq!(tree.depth(), 3);

        let names: Vec<&str> = tree.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["B1", "B2"]);
        assert_eq!(tree.children[0].id, b1.id);
        assert!(tree.children[0].children.is_empty());

        let nested = &tree.children[1].children;
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].id, b3.id);
        assert_eq!(nested[0].parent_id, Some(b2.id));
    }

    #[tokio::test]
    async fn test_branch_tree_terminates_on_cycle() {
        let fx = fixture();
        let (root, origin) = fx.chat_with_answer("Root").await;
        let child = fx.branch(root.id, &origin.response_id, "Child").await;

        // Point the child back at the root, and at itself
        let child_pair = fx.first_pair(child.id).await;
        fx.chats
            .link_branch(child.id, &child_pair.response_id, root.id)
            .await
            .unwrap();
        fx.chats
            .link_branch(child.id, &child_pair.response_id, child.id)
            .await
            .unwrap();

        let tree = fx.branches.build_branch_tree(root.id).await.unwrap();
        assert_eq!(tree.children.len(), 1);
        assert!(tree.children[0].children.is_empty());
        assert_eq!(tree.depth(), 2);
    }

    #[tokio::test]
    async fn test_set_active_branch() {
        let fx = fixture();
        let (chat, origin) = fx.chat_with_answer("Chat").await;
        let branch = fx.branch(chat.id, &origin.response_id, "B1").await;

        let outcome = fx
            .branches
            .set_active_branch(chat.id, branch.id)
            .await
            .unwrap();
        assert_eq!(outcome, ActiveBranchUpdate::Updated);

        let outcome = fx
            .branches
            .set_active_branch(chat.id, branch.id)
            .await
            .unwrap();
        assert_eq!(outcome, ActiveBranchUpdate::Unchanged);

        let content = fx.chats.get_chat_with_content(chat.id).await.unwrap();
        let active = content.active_branch_id.unwrap();
        assert!(content.qa_pairs.iter().any(|p| p.branches.contains(&active)));
    }

    #[tokio::test]
    async fn test_set_active_branch_unknown_branch() {
        let fx = fixture();
        let (chat, _) = fx.chat_with_answer("Chat").await;
        let stranger = fx
            .chats
            .create_chat(fx.owner, "Unrelated", ChatType::Personal)
            .await
            .unwrap();

        let err = fx
            .branches
            .set_active_branch(chat.id, stranger.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref m) if m == "Branch not found for this chat"));

        let content = fx.chats.get_chat_with_content(chat.id).await.unwrap();
        assert!(content.active_branch_id.is_none());
    }

    /// Memory content store whose QA pair writes can be switched off
    #[derive(Default)]
    struct FlakyContentStore {
        inner: MemoryContentStore,
        reject_pairs: AtomicBool,
    }

    #[async_trait]
    impl ContentStore for FlakyContentStore {
        async fn create_document(&self, chat_id: Uuid) -> StoreResult<ChatDocument> {
            self.inner.create_document(chat_id).await
        }
        async fn get_document(&self, chat_id: Uuid) -> StoreResult<Option<ChatDocument>> {
            self.inner.get_document(chat_id).await
        }
        async fn delete_document(&self, chat_id: Uuid) -> StoreResult<bool> {
            self.inner.delete_document(chat_id).await
        }
        async fn push_qa_pair(&self, chat_id: Uuid, pair: QaPair) -> StoreResult<bool> {
            if self.reject_pairs.load(Ordering::SeqCst) {
                return Ok(false);
            }
            self.inner.push_qa_pair(chat_id, pair).await
        }
        async fn find_qa_pair(
            &self,
            chat_id: Uuid,
            response_id: &str,
        ) -> StoreResult<Option<QaPair>> {
            self.inner.find_qa_pair(chat_id, response_id).await
        }
        async fn add_branch_to_pair(
            &self,
            chat_id: Uuid,
            response_id: &str,
            branch_id: Uuid,
        ) -> StoreResult<bool> {
            self.inner
                .add_branch_to_pair(chat_id, response_id, branch_id)
                .await
        }
        async fn remove_branch_from_pair(
            &self,
            chat_id: Uuid,
            response_id: &str,
            branch_id: Uuid,
        ) -> StoreResult<bool> {
            self.inner
                .remove_branch_from_pair(chat_id, response_id, branch_id)
                .await
        }
        async fn set_active_branch(&self, chat_id: Uuid, branch_id: Uuid) -> StoreResult<bool> {
            self.inner.set_active_branch(chat_id, branch_id).await
        }
    }

    #[tokio::test]
    async fn test_failed_copy_rolls_back_branch() {
        let flaky = Arc::new(FlakyContentStore::default());
        let mut stores = Stores::in_memory();
        stores.contents = flaky.clone();
        let fx = fixture_with(stores);

        let (chat, origin) = fx.chat_with_answer("Chat").await;
        flaky.reject_pairs.store(true, Ordering::SeqCst);

        let err = fx
            .branches
            .create_branch(chat.id, &origin.response_id, fx.owner, Some("Doomed".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UpstreamWriteFailure(_)));

        // Link removed and the half-built chat is gone from both stores
        let pair = fx.first_pair(chat.id).await;
        assert!(pair.branches.is_empty());
        let owned = fx.chats.list_user_chats(fx.owner).await.unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].id, chat.id);
        assert!(fx.branches.get_branches(chat.id).await.unwrap().is_empty());
    }
}
