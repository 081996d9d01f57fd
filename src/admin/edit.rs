//! User edit workflow.
//!
//! Proposed changes are collected in a [`UserChanges`] and applied to a copy
//! of the stored user only once every check passed. The photo is written at
//! that point too, and removed again if the store refuses the update.

use zeroize::Zeroizing;

use crate::admin::AdminPanel;
use crate::identity::PasswordVerification;
use crate::storage::unique_file_name;
use crate::user::{USER_NOT_FOUND, User};

pub const OLD_PASSWORD_INCORRECT: &str = "Old password is incorrect";
pub const NEW_PASSWORD_REQUIRED: &str = "New password is required";
pub const PHOTO_NOT_STORED: &str = "Unable to store photo";

/// Uploaded profile photo.
#[derive(Debug, Clone, Default)]
pub struct Photo {
    /// Name sent by the client. May contain a full path.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Requested update of a single user.
#[derive(Clone, Default)]
pub struct EditRequest {
    pub id: String,
    pub email: String,
    pub username: String,
    pub photo: Option<Photo>,
    pub old_password: Zeroizing<String>,
    pub new_password: Zeroizing<String>,
}

impl std::fmt::Debug for EditRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditRequest")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("username", &self.username)
            .field("photo", &self.photo.as_ref().map(|p| &p.file_name))
            .field("old_password", &"[REDACTED]")
            .field("new_password", &"[REDACTED]")
            .finish()
    }
}

/// Changes waiting to be applied on a [`User`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    email: Option<String>,
    username: Option<String>,
    photo_path: Option<String>,
    password_hash: Option<String>,
}

impl UserChanges {
    /// Create an empty [`UserChanges`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Set new `email`.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set new `username`.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set new `photo_path`.
    pub fn with_photo_path(mut self, photo_path: impl Into<String>) -> Self {
        self.photo_path = Some(photo_path.into());
        self
    }

    /// Set new `password_hash`.
    pub fn with_password_hash(mut self, hash: impl Into<String>) -> Self {
        self.password_hash = Some(hash.into());
        self
    }

    /// Return `user` with every recorded change applied.
    pub fn apply(&self, mut user: User) -> User {
        if let Some(email) = &self.email {
            user.email.clone_from(email);
        }
        if let Some(username) = &self.username {
            user.username.clone_from(username);
        }
        if let Some(photo_path) = &self.photo_path {
            user.photo_path = Some(photo_path.clone());
        }
        if let Some(hash) = &self.password_hash {
            user.password_hash.clone_from(hash);
        }
        user
    }
}

/// Result of an edit.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// Changes were persisted.
    Updated(User),
    /// Nothing was persisted. `user` is the stored user, untouched.
    Rejected { user: User, errors: Vec<String> },
    /// No user has the requested ID.
    NotFound,
}

impl EditOutcome {
    /// Messages to display next to the form.
    pub fn errors(&self) -> Vec<String> {
        match self {
            EditOutcome::Updated(_) => Vec::new(),
            EditOutcome::Rejected { errors, .. } => errors.clone(),
            EditOutcome::NotFound => vec![USER_NOT_FOUND.to_owned()],
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            EditOutcome::Updated(user) | EditOutcome::Rejected { user, .. } => {
                Some(user)
            },
            EditOutcome::NotFound => None,
        }
    }

    pub fn is_updated(&self) -> bool {
        matches!(self, EditOutcome::Updated(_))
    }
}

impl AdminPanel {
    /// Validate and apply `request`.
    ///
    /// The user is persisted only if user validation succeeded and, when an
    /// old password is given, every password check succeeded too.
    pub async fn edit_user(&self, request: EditRequest) -> EditOutcome {
        let Some(user) = self.identity.find_by_id(&request.id).await else {
            tracing::warn!(user_id = %request.id, "edit of unknown user");
            return EditOutcome::NotFound;
        };

        let mut errors = Vec::new();
        let mut changes = UserChanges::new()
            .with_email(&request.email)
            .with_username(&request.username);

        let photo = request
            .photo
            .as_ref()
            .map(|photo| (unique_file_name(&photo.file_name), photo));
        if let Some((name, _)) = &photo {
            changes = changes.with_photo_path(name.as_str());
        }

        let user_valid =
            match self.identity.validate_user(&changes.apply(user.clone())).await {
                Ok(()) => true,
                Err(err) => {
                    errors.extend(err.into_messages());
                    false
                },
            };

        let password_valid = if request.old_password.is_empty() {
            true
        } else {
            match self
                .check_password_change(
                    &user,
                    &request.old_password,
                    &request.new_password,
                    &mut errors,
                )
                .await
            {
                Some(hash) => {
                    changes = changes.with_password_hash(hash);
                    true
                },
                None => false,
            }
        };

        if !user_valid || !password_valid {
            tracing::debug!(user_id = %user.id, errors = errors.len(), "edit rejected");
            return EditOutcome::Rejected { user, errors };
        }

        // Commit.
        let stored_photo = match photo {
            Some((name, photo)) => {
                if let Err(err) = self
                    .storage
                    .store(&self.uploads, &name, &photo.bytes)
                    .await
                {
                    tracing::error!(user_id = %user.id, error = %err, "photo not stored");
                    errors.push(PHOTO_NOT_STORED.to_owned());
                    return EditOutcome::Rejected { user, errors };
                }
                Some(name)
            },
            None => None,
        };

        let updated = changes.apply(user.clone());
        match self.identity.update(&updated).await {
            Ok(()) => {
                metrics::counter!("admin_users_updated_total").increment(1);
                tracing::info!(user_id = %updated.id, "user updated");
                EditOutcome::Updated(updated)
            },
            Err(err) => {
                tracing::warn!(user_id = %user.id, error = %err, "user update failed");
                if let Some(name) = stored_photo {
                    if let Err(err) = self.storage.remove(&self.uploads, &name).await {
                        tracing::error!(file = %name, error = %err, "orphan photo left on storage");
                    }
                }
                errors.extend(err.into_messages());
                EditOutcome::Rejected { user, errors }
            },
        }
    }

    /// Run every password check and return the new hash if all passed.
    async fn check_password_change(
        &self,
        user: &User,
        old_password: &str,
        new_password: &str,
        errors: &mut Vec<String>,
    ) -> Option<String> {
        let mut valid = true;

        if self
            .identity
            .verify_password(user, &user.password_hash, old_password)
            == PasswordVerification::Failed
        {
            errors.push(OLD_PASSWORD_INCORRECT.to_owned());
            valid = false;
        }

        if let Err(err) = self.identity.validate_password(user, old_password).await {
            errors.extend(err.into_messages());
            valid = false;
        }

        if new_password.is_empty() {
            errors.push(NEW_PASSWORD_REQUIRED.to_owned());
            valid = false;
        } else if let Err(err) =
            self.identity.validate_password(user, new_password).await
        {
            errors.extend(err.into_messages());
            valid = false;
        }

        if !valid {
            return None;
        }

        match self.identity.hash_password(user, new_password) {
            Ok(hash) => Some(hash),
            Err(err) => {
                errors.extend(err.into_messages());
                None
            },
        }
    }
}
