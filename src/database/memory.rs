//! Process-local store backends used by tests and `--in-memory` runs

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::models::{
    Chat, ChatChanges, ChatDocument, ChatType, Conversation, NewConversation, NewUser, QaPair,
    User,
};
use super::store::{ChatStore, ContentStore, StoreError, StoreResult, UserStore};

/// Users, chats and conversations in one set of maps, mirroring the relational database
#[derive(Default)]
pub struct MemoryRelationalStore {
    users: RwLock<HashMap<Uuid, User>>,
    chats: RwLock<HashMap<Uuid, Chat>>,
    conversations: RwLock<HashMap<Uuid, Conversation>>,
}

#[async_trait]
impl UserStore for MemoryRelationalStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut users = self.users.write();
        if users
            .values()
            .any(|u| u.email == user.email || u.username == user.username)
        {
            return Err(StoreError::Conflict("User already exists".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: user.email,
            username: user.username,
            hashed_password: user.hashed_password,
            is_active: true,
            is_superuser: false,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().get(&user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl ChatStore for MemoryRelationalStore {
    async fn create_chat(
        &self,
        account_id: Uuid,
        name: &str,
        chat_type: ChatType,
    ) -> StoreResult<Chat> {
        let now = Utc::now();
        let chat = Chat {
            id: Uuid::new_v4(),
            account_id,
            name: name.to_string(),
            chat_type,
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.chats.write().insert(chat.id, chat.clone());
        Ok(chat)
    }

    async fn get_chat(&self, chat_id: Uuid) -> StoreResult<Option<Chat>> {
        Ok(self.chats.read().get(&chat_id).cloned())
    }

    async fn update_chat(&self, chat_id: Uuid, changes: ChatChanges) -> StoreResult<Option<Chat>> {
        let mut chats = self.chats.write();
        let Some(chat) = chats.get_mut(&chat_id) else {
            return Ok(None);
        };

        if let Some(name) = changes.name {
            chat.name = name;
        }
        if let Some(active) = changes.active {
            chat.active = active;
        }
        chat.updated_at = Utc::now();
        Ok(Some(chat.clone()))
    }

    async fn delete_chat(&self, chat_id: Uuid) -> StoreResult<bool> {
        let removed = self.chats.write().remove(&chat_id).is_some();
        if removed {
            // Same effect as the ON DELETE CASCADE on conversations
            self.conversations
                .write()
                .retain(|_, conversation| conversation.chat_id != chat_id);
        }
        Ok(removed)
    }

    async fn list_user_chats(&self, account_id: Uuid) -> StoreResult<Vec<Chat>> {
        let mut chats: Vec<Chat> = self
            .chats
            .read()
            .values()
            .filter(|chat| chat.account_id == account_id)
            .cloned()
            .collect();
        chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(chats)
    }

    async fn create_conversation(
        &self,
        conversation: NewConversation,
    ) -> StoreResult<Conversation> {
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            chat_id: conversation.chat_id,
            account_id: conversation.account_id,
            name: conversation.name,
            deleted: false,
            parent_id: conversation.parent_id,
            created_at: now,
            updated_at: now,
        };
        self.conversations
            .write()
            .insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn list_chat_conversations(&self, chat_id: Uuid) -> StoreResult<Vec<Conversation>> {
        let mut conversations: Vec<Conversation> = self
            .conversations
            .read()
            .values()
            .filter(|c| c.chat_id == chat_id && !c.deleted)
            .cloned()
            .collect();
        conversations.sort_by_key(|c| c.created_at);
        Ok(conversations)
    }
}

/// Chat documents keyed by chat id
#[derive(Default)]
pub struct MemoryContentStore {
    documents: RwLock<HashMap<Uuid, ChatDocument>>,
}

impl MemoryContentStore {
    fn with_pair<F>(&self, chat_id: Uuid, response_id: &str, update: F) -> bool
    where
        F: FnOnce(&mut QaPair) -> bool,
    {
        let mut documents = self.documents.write();
        documents
            .get_mut(&chat_id)
            .and_then(|doc| {
                doc.qa_pairs
                    .iter_mut()
                    .find(|pair| pair.response_id == response_id)
            })
            .map(update)
            .unwrap_or(false)
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn create_document(&self, chat_id: Uuid) -> StoreResult<ChatDocument> {
        let mut documents = self.documents.write();
        let document = documents
            .entry(chat_id)
            .or_insert_with(|| ChatDocument::empty(chat_id));
        Ok(document.clone())
    }

    async fn get_document(&self, chat_id: Uuid) -> StoreResult<Option<ChatDocument>> {
        Ok(self.documents.read().get(&chat_id).cloned())
    }

    async fn delete_document(&self, chat_id: Uuid) -> StoreResult<bool> {
        Ok(self.documents.write().remove(&chat_id).is_some())
    }

    async fn push_qa_pair(&self, chat_id: Uuid, pair: QaPair) -> StoreResult<bool> {
        let mut documents = self.documents.write();
        match documents.get_mut(&chat_id) {
            Some(document) => {
                document.qa_pairs.push(pair);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_qa_pair(&self, chat_id: Uuid, response_id: &str) -> StoreResult<Option<QaPair>> {
        Ok(self
            .documents
            .read()
            .get(&chat_id)
            .and_then(|doc| doc.find_pair(response_id).cloned()))
    }

    async fn add_branch_to_pair(
        &self,
        chat_id: Uuid,
        response_id: &str,
        branch_id: Uuid,
    ) -> StoreResult<bool> {
        Ok(self.with_pair(chat_id, response_id, |pair| {
            pair.branches.push(branch_id);
            true
        }))
    }

    async fn remove_branch_from_pair(
        &self,
        chat_id: Uuid,
        response_id: &str,
        branch_id: Uuid,
    ) -> StoreResult<bool> {
        Ok(self.with_pair(chat_id, response_id, |pair| {
            let before = pair.branches.len();
            pair.branches.retain(|id| *id != branch_id);
            pair.branches.len() != before
        }))
    }

    async fn set_active_branch(&self, chat_id: Uuid, branch_id: Uuid) -> StoreResult<bool> {
        let mut documents = self.documents.write();
        match documents.get_mut(&chat_id) {
            Some(document) if document.active_branch_id != Some(branch_id) => {
                document.active_branch_id = Some(branch_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_users_conflict() {
        let store = MemoryRelationalStore::default();
        let new_user = |email: &str, username: &str| NewUser {
            email: email.to_string(),
            username: username.to_string(),
            hashed_password: "hash".to_string(),
        };

        store.create_user(new_user("a@x.com", "a")).await.unwrap();
        let err = store.create_user(new_user("a@x.com", "b")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let found = store.get_user_by_username("a").await.unwrap().unwrap();
        assert_eq!(found.email, "a@x.com");
        assert!(found.is_active);
    }

    #[tokio::test]
    async fn test_update_chat_bumps_updated_at() {
        let store = MemoryRelationalStore::default();
        let chat = store
            .create_chat(Uuid::new_v4(), "Before", ChatType::Personal)
            .await
            .unwrap();

        let updated = store
            .update_chat(chat.id, ChatChanges::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Before");
        assert!(updated.updated_at >= chat.updated_at);

        assert!(store
            .update_chat(Uuid::new_v4(), ChatChanges::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_chat_cascades_conversations() {
        let store = MemoryRelationalStore::default();
        let owner = Uuid::new_v4();
        let chat = store
            .create_chat(owner, "Chat", ChatType::Branch)
            .await
            .unwrap();
        store
            .create_conversation(NewConversation {
                chat_id: chat.id,
                account_id: owner,
                name: "Chat".to_string(),
                parent_id: None,
            })
            .await
            .unwrap();

        assert!(store.delete_chat(chat.id).await.unwrap());
        assert!(store.list_chat_conversations(chat.id).await.unwrap().is_empty());
        assert!(!store.delete_chat(chat.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_set_active_branch_reports_no_op() {
        let store = MemoryContentStore::default();
        let chat_id = Uuid::new_v4();
        let branch_id = Uuid::new_v4();

        assert!(!store.set_active_branch(chat_id, branch_id).await.unwrap());

        store.create_document(chat_id).await.unwrap();
        assert!(store.set_active_branch(chat_id, branch_id).await.unwrap());
        assert!(!store.set_active_branch(chat_id, branch_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_branch_links_on_pairs() {
        let store = MemoryContentStore::default();
        let chat_id = Uuid::new_v4();
        let branch_id = Uuid::new_v4();
        store.create_document(chat_id).await.unwrap();

        let pair = QaPair::new("q", "r", None);
        let response_id = pair.response_id.clone();
        assert!(store.push_qa_pair(chat_id, pair).await.unwrap());

        assert!(!store
            .add_branch_to_pair(chat_id, "missing", branch_id)
            .await
            .unwrap());
        assert!(store
            .add_branch_to_pair(chat_id, &response_id, branch_id)
            .await
            .unwrap());

        let pair = store.find_qa_pair(chat_id, &response_id).await.unwrap().unwrap();
        assert_eq!(pair.branches, vec![branch_id]);

        assert!(store
            .remove_branch_from_pair(chat_id, &response_id, branch_id)
            .await
            .unwrap());
        assert!(!store
            .remove_branch_from_pair(chat_id, &response_id, branch_id)
            .await
            .unwrap());
    }
}
