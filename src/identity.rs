//! Identity service port.
//!
//! Everything the admin panel knows about users goes through
//! [`IdentityService`]: lookup, listing, persistence, field validation and
//! password hashing.

use async_trait::async_trait;

use crate::user::User;

/// Result returned by identity operations.
pub type IdentityResult<T = ()> = std::result::Result<T, IdentityErrors>;

/// Ordered list of user-facing messages describing why an identity
/// operation failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{}", .0.join(" "))]
pub struct IdentityErrors(pub Vec<String>);

impl IdentityErrors {
    /// Create errors from a single message.
    pub fn single(message: impl Into<String>) -> Self {
        Self(vec![message.into()])
    }

    /// Append a message.
    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    /// Turn accumulated messages into an [`IdentityResult`].
    pub fn into_result(self) -> IdentityResult {
        if self.0.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Consume and return the messages.
    pub fn into_messages(self) -> Vec<String> {
        self.0
    }
}

/// Outcome of comparing a candidate password with a stored hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordVerification {
    Success,
    Failed,
}

/// Port for user storage, validation and password hashing.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Find a user by its ID.
    async fn find_by_id(&self, id: &str) -> Option<User>;

    /// List every user, in store order.
    async fn list_all(&self) -> Vec<User>;

    /// Delete a user.
    async fn delete(&self, user: &User) -> IdentityResult;

    /// Persist every field of `user`. This is the commit point of an edit.
    async fn update(&self, user: &User) -> IdentityResult;

    /// Validate email and username of `user` (format and uniqueness).
    async fn validate_user(&self, user: &User) -> IdentityResult;

    /// Validate `candidate` against the password policy.
    async fn validate_password(
        &self,
        user: &User,
        candidate: &str,
    ) -> IdentityResult;

    /// Check `candidate` against `stored_hash`.
    fn verify_password(
        &self,
        user: &User,
        stored_hash: &str,
        candidate: &str,
    ) -> PasswordVerification;

    /// Hash `plaintext` into a storable credential.
    fn hash_password(&self, user: &User, plaintext: &str)
    -> IdentityResult<String>;
}
