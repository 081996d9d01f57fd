//! Users and the reference identity service backing the admin panel.
mod builder;
mod repository;
mod service;
mod validation;

pub use builder::*;
pub use repository::*;
pub use service::*;
pub use validation::*;

#[cfg(test)]
pub(crate) use service::tests;

use serde::{Deserialize, Serialize};

/// User as held by the identity store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    pub photo_path: Option<String>,
    pub roles: Vec<String>,
    pub created_at: chrono::NaiveDate,
    /// Changes on every update. A copy carrying an older stamp is stale.
    #[serde(skip)]
    pub concurrency_stamp: String,
}

impl User {
    /// Start a [`UserBuilder`].
    pub fn builder() -> UserBuilder<Missing, Missing> {
        UserBuilder::new()
    }

    /// Whether the user holds `role`. Role names are case-insensitive.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }
}
