//! User and password validators.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex_lite::Regex;
use validator::ValidateEmail;

use crate::config::PasswordPolicy;
use crate::identity::{IdentityErrors, IdentityResult};
use crate::user::{User, UserRepository};

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\-._@+]+$").unwrap());

/// Check email and username of a user before it is saved.
#[derive(Debug, Clone, Default)]
pub struct UserValidator;

impl UserValidator {
    /// Validate format and uniqueness of `email` and `username`.
    pub async fn validate(
        &self,
        repo: &UserRepository,
        user: &User,
    ) -> IdentityResult {
        self.check(&repo.list().await, user)
    }

    /// Validate `user` against the given `users`.
    ///
    /// Uniqueness ignores case and the stored copy of `user` itself.
    pub fn check(&self, users: &[User], user: &User) -> IdentityResult {
        let mut errors = IdentityErrors::default();
        let others = || users.iter().filter(|other| other.id != user.id);

        if !user.email.validate_email() {
            errors.push(format!("Email '{}' is invalid.", user.email));
        } else if others().any(|other| other.email.eq_ignore_ascii_case(&user.email)) {
            errors.push(format!("Email '{}' is already taken.", user.email));
        }

        if !USERNAME_RE.is_match(&user.username) {
            errors.push(format!(
                "Username '{}' is invalid, can only contain letters or digits.",
                user.username
            ));
        } else if others()
            .any(|other| other.username.eq_ignore_ascii_case(&user.username))
        {
            errors
                .push(format!("Username '{}' is already taken.", user.username));
        }

        errors.into_result()
    }
}

/// Check a candidate password against a [`PasswordPolicy`].
#[derive(Debug, Clone, Default)]
pub struct PasswordValidator {
    policy: PasswordPolicy,
}

impl PasswordValidator {
    /// Create a new [`PasswordValidator`].
    pub fn new(policy: PasswordPolicy) -> Self {
        Self { policy }
    }

    /// Every policy violation is reported, not only the first one.
    pub fn validate(&self, password: &str) -> IdentityResult {
        let policy = &self.policy;
        let mut errors = IdentityErrors::default();

        if password.chars().count() < policy.required_length {
            errors.push(format!(
                "Passwords must be at least {} characters.",
                policy.required_length
            ));
        }
        if policy.require_non_alphanumeric
            && password.chars().all(char::is_alphanumeric)
        {
            errors.push(
                "Passwords must have at least one non alphanumeric character.",
            );
        }
        if policy.require_digit && !password.chars().any(|c| c.is_ascii_digit())
        {
            errors.push("Passwords must have at least one digit ('0'-'9').");
        }
        if policy.require_lowercase
            && !password.chars().any(|c| c.is_ascii_lowercase())
        {
            errors.push("Passwords must have at least one lowercase ('a'-'z').");
        }
        if policy.require_uppercase
            && !password.chars().any(|c| c.is_ascii_uppercase())
        {
            errors.push("Passwords must have at least one uppercase ('A'-'Z').");
        }
        if policy.required_unique_chars > 1
            && password.chars().collect::<HashSet<_>>().len()
                < policy.required_unique_chars
        {
            errors.push(format!(
                "Passwords must use at least {} different characters.",
                policy.required_unique_chars
            ));
        }

        errors.into_result()
    }
}
