use async_trait::async_trait;

use crate::config::{PasswordPolicy, SeedUser};
use crate::crypto::PasswordManager;
use crate::identity::{
    IdentityErrors, IdentityResult, IdentityService, PasswordVerification,
};
use crate::user::{PasswordValidator, User, UserRepository, UserValidator};

/// Reference [`IdentityService`] over the in-memory [`UserRepository`].
#[derive(Debug, Clone)]
pub struct Identity {
    pub repo: UserRepository,
    pwd: PasswordManager,
    user_validator: UserValidator,
    password_validator: PasswordValidator,
}

impl Identity {
    /// Create a new [`Identity`].
    pub fn new(
        repo: UserRepository,
        pwd: PasswordManager,
        policy: PasswordPolicy,
    ) -> Self {
        Self {
            repo,
            pwd,
            user_validator: UserValidator,
            password_validator: PasswordValidator::new(policy),
        }
    }

    /// Hash the seed password and insert the account.
    pub async fn seed(&self, seed: &SeedUser) -> IdentityResult {
        let password_hash = self
            .pwd
            .hash_password(&seed.password)
            .map_err(|err| IdentityErrors::single(err.to_string()))?;

        let user = User::builder()
            .id(&seed.id)
            .email(&seed.email)
            .username(seed.username.as_deref().unwrap_or(&seed.id))
            .password_hash(password_hash)
            .roles(seed.roles.iter().cloned())
            .build();

        self.repo.insert(user).await?;
        tracing::debug!(user_id = %seed.id, "seed user inserted");
        Ok(())
    }
}

#[async_trait]
impl IdentityService for Identity {
    async fn find_by_id(&self, id: &str) -> Option<User> {
        self.repo.find_by_id(id).await
    }

    async fn list_all(&self) -> Vec<User> {
        self.repo.list().await
    }

    async fn delete(&self, user: &User) -> IdentityResult {
        self.repo.delete(&user.id).await
    }

    async fn update(&self, user: &User) -> IdentityResult {
        self.repo
            .update(user, |users, user| self.user_validator.check(users, user))
            .await
    }

    async fn validate_user(&self, user: &User) -> IdentityResult {
        self.user_validator.validate(&self.repo, user).await
    }

    async fn validate_password(
        &self,
        _user: &User,
        candidate: &str,
    ) -> IdentityResult {
        self.password_validator.validate(candidate)
    }

    fn verify_password(
        &self,
        _user: &User,
        stored_hash: &str,
        candidate: &str,
    ) -> PasswordVerification {
        match self.pwd.verify_password(candidate, stored_hash) {
            Ok(()) => PasswordVerification::Success,
            Err(_) => PasswordVerification::Failed,
        }
    }

    fn hash_password(
        &self,
        _user: &User,
        plaintext: &str,
    ) -> IdentityResult<String> {
        self.pwd.hash_password(plaintext).map_err(|err| {
            tracing::error!(error = %err, "password hashing failed");
            IdentityErrors::single("Password could not be hashed.")
        })
    }
}
