//! Middlewares for routes.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use crate::AppState;
use crate::ServerError;
use crate::error::Result;
use crate::user::User;

const BEARER: &str = "Bearer ";

/// Require a valid token whose subject holds the admin role.
///
/// The authenticated [`User`] is inserted into request extensions.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|token| token.strip_prefix(BEARER))
        .ok_or(ServerError::Unauthorized)?;

    let claims = state.token.decode(token).map_err(|err| {
        tracing::debug!(error = %err, "token refused");
        ServerError::Unauthorized
    })?;

    let Some(user) = state.panel.identity().find_by_id(&claims.sub).await else {
        return Err(ServerError::Unauthorized);
    };

    if !user.has_role(&state.config.admin_role) {
        tracing::warn!(user_id = %user.id, "admin route refused");
        return Err(ServerError::Forbidden);
    }

    req.extensions_mut().insert::<User>(user);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::token::TokenManager;
    use crate::*;

    async fn list_with(
        state: &AppState,
        authorization: Option<&str>,
    ) -> StatusCode {
        use tower::util::ServiceExt;

        let mut req = axum::extract::Request::builder()
            .method(Method::GET)
            .uri("/admin/users");
        if let Some(value) = authorization {
            req = req.header(header::AUTHORIZATION, value);
        }

        app(state.clone())
            .oneshot(req.body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_token_without_bearer_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let state = router::tests::state(dir.path()).await;
        let token = state.token.create(router::tests::ADMIN).unwrap();

        assert_eq!(list_with(&state, Some(&token)).await, StatusCode::UNAUTHORIZED);
        assert_eq!(
            list_with(&state, Some(&format!("Basic {token}"))).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            list_with(&state, Some(&format!("Bearer {token}"))).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_token_signed_elsewhere() {
        let dir = tempfile::tempdir().unwrap();
        let state = router::tests::state(dir.path()).await;

        let forged = TokenManager::new(&state.config.name, "another-secret")
            .create(router::tests::ADMIN)
            .unwrap();
        assert_eq!(
            list_with(&state, Some(&format!("Bearer {forged}"))).await,
            StatusCode::UNAUTHORIZED
        );

        let mut issuer = TokenManager::new(&state.config.name, "test-secret");
        issuer.audience("somewhere.else");
        let token = issuer.create(router::tests::ADMIN).unwrap();
        assert_eq!(
            list_with(&state, Some(&format!("Bearer {token}"))).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_token_of_deleted_user() {
        let dir = tempfile::tempdir().unwrap();
        let state = router::tests::state(dir.path()).await;
        let token = state.token.create(router::tests::ADMIN).unwrap();

        let root = state.panel.identity().find_by_id(router::tests::ADMIN).await.unwrap();
        state.panel.identity().delete(&root).await.unwrap();

        assert_eq!(
            list_with(&state, Some(&format!("Bearer {token}"))).await,
            StatusCode::UNAUTHORIZED
        );
    }
}
