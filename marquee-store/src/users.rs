use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use marquee_core::repository::UserDirectory;
use marquee_core::{CoreResult, User};

/// In-memory stand-in for the account system, keyed by username.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.username.clone(), user);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_username(&self, username: &str) -> CoreResult<Option<User>> {
        Ok(self.users.read().await.get(username).cloned())
    }
}
