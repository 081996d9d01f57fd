//! HTTP API.
pub mod status;
pub mod users;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::ServerError;

/// JSON body checked with [`Validate`] before reaching the handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct Valid<T>(pub T);

impl<T, S> FromRequest<S> for Valid<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Valid(value))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use crate::admin::AdminPanel;
    use crate::config::{Configuration, SeedUser};
    use crate::storage::LocalStorage;
    use crate::token::TokenManager;
    use crate::user::tests::{identity, seed_user};
    use crate::AppState;

    pub(crate) const ADMIN: &str = "root";

    /// State with `root` (admin), `alice` and `bob`, storing photos under
    /// `uploads`.
    pub(crate) async fn state(uploads: &Path) -> AppState {
        let mut config = Configuration::default();
        config.uploads = uploads.to_path_buf();

        let identity = identity();
        identity
            .seed(&SeedUser {
                roles: vec!["Admin".into()],
                ..seed_user(ADMIN, "R00t!pass")
            })
            .await
            .unwrap();
        identity.seed(&seed_user("alice", "Pa$$w0rd")).await.unwrap();
        identity.seed(&seed_user("bob", "Pa$$w0rd")).await.unwrap();

        AppState {
            panel: AdminPanel::new(
                Arc::new(identity),
                Arc::new(LocalStorage),
                &config.uploads,
            ),
            token: TokenManager::new(&config.name, "test-secret"),
            config: Arc::new(config),
            metrics: None,
        }
    }
}
