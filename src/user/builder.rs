//! Typed builder for User.

use crate::user::User;

/// [`User`] builder.
///
/// `id` and `email` must both be set before [`UserBuilder::build`] is
/// available.
#[derive(Debug, Clone)]
pub struct UserBuilder<Id, Email> {
    id: Id,
    email: Email,
    username: String,
    password_hash: String,
    roles: Vec<String>,
    created_at: Option<chrono::NaiveDate>,
}

/// Value is missing on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Missing;

/// Value is present on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Present<T>(pub T);

impl UserBuilder<Missing, Missing> {
    /// Create a new [`UserBuilder`].
    pub fn new() -> Self {
        Self {
            id: Missing,
            email: Missing,
            username: String::default(),
            password_hash: String::default(),
            roles: Vec::new(),
            created_at: None,
        }
    }
}

impl Default for UserBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Email> UserBuilder<Missing, Email> {
    /// Update `id` field on [`UserBuilder`].
    pub fn id(self, id: impl Into<String>) -> UserBuilder<Present<String>, Email> {
        UserBuilder {
            id: Present(id.into()),
            email: self.email,
            username: self.username,
            password_hash: self.password_hash,
            roles: self.roles,
            created_at: self.created_at,
        }
    }
}

impl<Id> UserBuilder<Id, Missing> {
    /// Update `email` field on [`UserBuilder`].
    pub fn email(self, email: impl Into<String>) -> UserBuilder<Id, Present<String>> {
        UserBuilder {
            id: self.id,
            email: Present(email.into()),
            username: self.username,
            password_hash: self.password_hash,
            roles: self.roles,
            created_at: self.created_at,
        }
    }
}

impl<Id, Email> UserBuilder<Id, Email> {
    /// Update `username` field on [`UserBuilder`].
    pub fn username(mut self, username: impl ToString) -> Self {
        self.username = username.to_string();
        self
    }

    /// Update `password_hash` field on [`UserBuilder`].
    ///
    /// The value must already be hashed.
    pub fn password_hash(mut self, hash: impl ToString) -> Self {
        self.password_hash = hash.to_string();
        self
    }

    /// Update `roles` field on [`UserBuilder`].
    pub fn roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Update `created_at` field on [`UserBuilder`].
    /// Default is today.
    pub fn created_at(mut self, date: chrono::NaiveDate) -> Self {
        self.created_at = Some(date);
        self
    }
}

impl UserBuilder<Present<String>, Present<String>> {
    /// Build a [`User`] with `id` and `email`.
    pub fn build(self) -> User {
        let username = if self.username.is_empty() {
            self.id.0.clone()
        } else {
            self.username
        };

        User {
            id: self.id.0,
            email: self.email.0,
            username,
            password_hash: self.password_hash,
            photo_path: None,
            roles: self.roles,
            created_at: self
                .created_at
                .unwrap_or_else(|| chrono::Utc::now().date_naive()),
            concurrency_stamp: uuid::Uuid::new_v4().to_string(),
        }
    }
}
