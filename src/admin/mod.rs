//! User administration: directory listing, deletion and edition.
mod edit;

pub use edit::*;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::identity::IdentityService;
use crate::storage::FileStorage;
use crate::user::{USER_NOT_FOUND, User};

/// Admin operations over the identity service.
#[derive(Clone)]
pub struct AdminPanel {
    identity: Arc<dyn IdentityService>,
    storage: Arc<dyn FileStorage>,
    uploads: PathBuf,
}

/// Values shown on the edit form of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserForm {
    pub id: String,
    pub email: String,
    pub username: String,
    pub photo_path: Option<String>,
}

impl From<User> for UserForm {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            photo_path: user.photo_path,
        }
    }
}

impl AdminPanel {
    /// Create a new [`AdminPanel`] storing photos under `uploads`.
    pub fn new(
        identity: Arc<dyn IdentityService>,
        storage: Arc<dyn FileStorage>,
        uploads: impl Into<PathBuf>,
    ) -> Self {
        Self {
            identity,
            storage,
            uploads: uploads.into(),
        }
    }

    /// Identity service used by the panel.
    pub fn identity(&self) -> &Arc<dyn IdentityService> {
        &self.identity
    }

    /// Every user, in store order.
    pub async fn list_users(&self) -> Vec<User> {
        self.identity.list_all().await
    }

    /// Delete every user whose ID is in `ids`.
    ///
    /// A failed deletion does not stop the others. Returns the failure
    /// messages, or a single [`USER_NOT_FOUND`] if nothing matched.
    pub async fn delete_users(&self, ids: &HashSet<String>) -> Vec<String> {
        let users: Vec<User> = self
            .identity
            .list_all()
            .await
            .into_iter()
            .filter(|user| ids.contains(&user.id))
            .collect();

        if users.is_empty() {
            tracing::warn!(requested = ids.len(), "no user matches deletion request");
            return vec![USER_NOT_FOUND.to_owned()];
        }

        let mut errors = Vec::new();
        for user in users {
            match self.identity.delete(&user).await {
                Ok(()) => {
                    metrics::counter!("admin_users_deleted_total").increment(1);
                    tracing::info!(user_id = %user.id, "user deleted");
                },
                Err(err) => {
                    tracing::warn!(user_id = %user.id, error = %err, "user deletion failed");
                    errors.extend(err.into_messages());
                },
            }
        }

        errors
    }

    /// Current values of a user for the edit form.
    pub async fn edit_form(&self, id: &str) -> Option<UserForm> {
        self.identity.find_by_id(id).await.map(UserForm::from)
    }
}

impl std::fmt::Debug for AdminPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminPanel")
            .field("uploads", &self.uploads)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::path::Path;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::identity::{
        IdentityErrors, IdentityResult, PasswordVerification,
    };
    use crate::user::Identity;
    use crate::user::tests::{identity, seed_user};

    /// Identity wrapper counting commits and injecting failures.
    pub(crate) struct FakeIdentity {
        pub inner: Identity,
        pub updates: AtomicUsize,
        pub fail_update: bool,
        pub fail_delete: HashSet<String>,
    }

    impl FakeIdentity {
        pub(crate) fn new(inner: Identity) -> Self {
            Self {
                inner,
                updates: AtomicUsize::new(0),
                fail_update: false,
                fail_delete: HashSet::new(),
            }
        }

        pub(crate) fn updates(&self) -> usize {
            self.updates.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IdentityService for FakeIdentity {
        async fn find_by_id(&self, id: &str) -> Option<User> {
            self.inner.find_by_id(id).await
        }

        async fn list_all(&self) -> Vec<User> {
            self.inner.list_all().await
        }

        async fn delete(&self, user: &User) -> IdentityResult {
            if self.fail_delete.contains(&user.id) {
                return Err(IdentityErrors::single(format!(
                    "Cannot delete '{}'.",
                    user.id
                )));
            }
            self.inner.delete(user).await
        }

        async fn update(&self, user: &User) -> IdentityResult {
            self.updates.fetch_add(1, Ordering::SeqCst);
            if self.fail_update {
                return Err(IdentityErrors::single("Optimistic concurrency failure."));
            }
            self.inner.update(user).await
        }

        async fn validate_user(&self, user: &User) -> IdentityResult {
            self.inner.validate_user(user).await
        }

        async fn validate_password(
            &self,
            user: &User,
            candidate: &str,
        ) -> IdentityResult {
            self.inner.validate_password(user, candidate).await
        }

        fn verify_password(
            &self,
            user: &User,
            stored_hash: &str,
            candidate: &str,
        ) -> PasswordVerification {
            self.inner.verify_password(user, stored_hash, candidate)
        }

        fn hash_password(
            &self,
            user: &User,
            plaintext: &str,
        ) -> IdentityResult<String> {
            self.inner.hash_password(user, plaintext)
        }
    }

    /// Storage recording writes in memory.
    #[derive(Default)]
    pub(crate) struct MemoryStorage {
        pub files: Mutex<Vec<String>>,
        pub fail: bool,
    }

    #[async_trait]
    impl FileStorage for MemoryStorage {
        async fn store(
            &self,
            _directory: &Path,
            filename: &str,
            _bytes: &[u8],
        ) -> std::io::Result<()> {
            if self.fail {
                return Err(std::io::Error::other("disk full"));
            }
            self.files.lock().unwrap().push(filename.to_owned());
            Ok(())
        }

        async fn remove(
            &self,
            _directory: &Path,
            filename: &str,
        ) -> std::io::Result<()> {
            self.files.lock().unwrap().retain(|f| f != filename);
            Ok(())
        }
    }

    /// Identity seeded with `alice` and `bob`, both using `Pa$$w0rd`.
    pub(crate) async fn seeded() -> Identity {
        let identity = identity();
        identity.seed(&seed_user("alice", "Pa$$w0rd")).await.unwrap();
        identity.seed(&seed_user("bob", "Pa$$w0rd")).await.unwrap();
        identity
    }

    fn panel(identity: Arc<FakeIdentity>) -> AdminPanel {
        AdminPanel::new(identity, Arc::new(MemoryStorage::default()), "uploads")
    }

    fn ids(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[tokio::test]
    async fn test_list_users() {
        let panel = panel(Arc::new(FakeIdentity::new(seeded().await)));

        let users = panel.list_users().await;
        let ids: Vec<_> = users.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, ["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_delete_unknown_users() {
        let identity = Arc::new(FakeIdentity::new(seeded().await));
        let panel = panel(Arc::clone(&identity));

        assert_eq!(panel.delete_users(&ids(&["carol"])).await, vec![USER_NOT_FOUND]);
        assert_eq!(panel.delete_users(&HashSet::new()).await, vec![USER_NOT_FOUND]);
        assert_eq!(panel.list_users().await.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_continues_on_error() {
        let mut identity = FakeIdentity::new(seeded().await);
        identity.fail_delete.insert("alice".into());
        let identity = Arc::new(identity);
        let panel = panel(Arc::clone(&identity));

        let errors = panel.delete_users(&ids(&["alice", "bob", "carol"])).await;
        assert_eq!(errors, vec!["Cannot delete 'alice'."]);

        assert!(identity.find_by_id("alice").await.is_some());
        assert!(identity.find_by_id("bob").await.is_none());
    }

    #[tokio::test]
    async fn test_edit_form() {
        let panel = panel(Arc::new(FakeIdentity::new(seeded().await)));

        let form = panel.edit_form("alice").await.unwrap();
        assert_eq!(form.email, "alice@example.com");
        assert_eq!(form.username, "alice");
        assert!(panel.edit_form("carol").await.is_none());
    }
}
