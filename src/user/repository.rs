//! In-memory user store.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::identity::{IdentityErrors, IdentityResult};
use crate::user::User;

/// Message reported when an ID matches no stored user.
pub const USER_NOT_FOUND: &str = "User Not Found";

/// Message reported when an update is based on an outdated copy.
pub const CONCURRENCY_FAILURE: &str =
    "Optimistic concurrency failure, object has been modified.";

/// Users kept in insertion order behind an async lock.
#[derive(Clone, Debug, Default)]
pub struct UserRepository {
    users: Arc<RwLock<Vec<User>>>,
}

impl UserRepository {
    /// Create a new empty [`UserRepository`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert [`User`] into the store.
    pub async fn insert(&self, user: User) -> IdentityResult {
        let mut users = self.users.write().await;

        if users.iter().any(|u| u.id == user.id) {
            return Err(IdentityErrors::single(format!(
                "User '{}' already exists.",
                user.id
            )));
        }

        users.push(user);
        Ok(())
    }

    /// Find a user using `id` field.
    pub async fn find_by_id(&self, user_id: &str) -> Option<User> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
    }

    /// Every stored user.
    pub async fn list(&self) -> Vec<User> {
        self.users.read().await.clone()
    }

    /// Replace the stored user sharing `user.id`.
    ///
    /// `check` runs against every stored user under the write lock. The
    /// stored copy must carry the same concurrency stamp as `user`, which
    /// then gets a new one.
    pub async fn update<F>(&self, user: &User, check: F) -> IdentityResult
    where
        F: FnOnce(&[User], &User) -> IdentityResult,
    {
        let mut users = self.users.write().await;

        let Some(index) = users.iter().position(|u| u.id == user.id) else {
            return Err(IdentityErrors::single(USER_NOT_FOUND));
        };
        if users[index].concurrency_stamp != user.concurrency_stamp {
            return Err(IdentityErrors::single(CONCURRENCY_FAILURE));
        }
        check(&users, user)?;

        users[index] = User {
            concurrency_stamp: uuid::Uuid::new_v4().to_string(),
            ..user.clone()
        };
        Ok(())
    }

    /// Delete a user.
    pub async fn delete(&self, user_id: &str) -> IdentityResult {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.id != user_id);

        if users.len() == before {
            Err(IdentityErrors::single(USER_NOT_FOUND))
        } else {
            Ok(())
        }
    }
}
