use std::collections::HashMap;

use async_trait::async_trait;

use crate::core::models::User;
use crate::errors::UserLookupError;

/// Resolves a speaker id to a user record.
#[async_trait]
pub trait UserProvider: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<User, UserLookupError>;
}

/// In-memory [`UserProvider`] over a fixed set of users.
#[derive(Debug, Clone, Default)]
pub struct StaticUserDirectory {
    users: HashMap<String, User>,
}

impl StaticUserDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>, user: User) -> Self {
        self.insert(user_id, user);
        self
    }

    pub fn insert(&mut self, user_id: impl Into<String>, user: User) {
        self.users.insert(user_id.into(), user);
    }
}

impl FromIterator<(String, User)> for StaticUserDirectory {
    fn from_iter<I: IntoIterator<Item = (String, User)>>(iter: I) -> Self {
        Self {
            users: iter.into_iter().collect(),
        }
    }
}

#[async_trait]
impl UserProvider for StaticUserDirectory {
    async fn get(&self, user_id: &str) -> Result<User, UserLookupError> {
        self.users
            .get(user_id)
            .cloned()
            .ok_or_else(|| UserLookupError::NotFound(user_id.to_string()))
    }
}
