use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    repo::{StoreError, UniqueField, UserStore},
    repo_types::{HistoryEntry, NewUser, User},
};

/// In-process [`UserStore`] with the same uniqueness rules as the Postgres schema.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == new_user.email) {
            return Err(StoreError::Duplicate(UniqueField::Email));
        }
        if users.values().any(|u| u.username == new_user.username) {
            return Err(StoreError::Duplicate(UniqueField::Username));
        }

        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            username: new_user.username,
            password_hash: new_user.password_hash,
            image: new_user.image,
            search_history: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn push_history(&self, user_id: Uuid, entry: HistoryEntry) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&user_id)
            .ok_or(StoreError::UnknownUser(user_id))?;
        user.search_history.push(entry);
        user.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }

    async fn pull_history(&self, user_id: Uuid, external_id: i64) -> Result<u64, StoreError> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&user_id) else {
            return Ok(0);
        };
        let before = user.search_history.len();
        user.search_history.retain(|e| e.id != external_id);
        let removed = (before - user.search_history.len()) as u64;
        if removed > 0 {
            user.updated_at = OffsetDateTime::now_utc();
        }
        Ok(removed)
    }
}
