//! List every user.

use axum::Json;
use axum::extract::State;

use super::Directory;
use crate::AppState;

pub async fn handler(State(state): State<AppState>) -> Json<Directory> {
    Json(Directory {
        users: state.panel.list_users().await,
        errors: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use http_body_util::BodyExt;

    use super::*;
    use crate::*;

    #[tokio::test]
    async fn test_list_handler() {
        let dir = tempfile::tempdir().unwrap();
        let state = router::tests::state(dir.path()).await;
        let app = app(state.clone());

        let response = make_request(
            Some(&state),
            app,
            Method::GET,
            "/admin/users",
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        // Password hashes never leave the server.
        assert!(json["users"][0].get("passwordHash").is_none());

        let body: Directory = serde_json::from_slice(&body).unwrap();
        let ids: Vec<_> = body.users.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, ["root", "alice", "bob"]);
        assert!(body.errors.is_empty());
    }

    #[tokio::test]
    async fn test_list_requires_token() {
        let dir = tempfile::tempdir().unwrap();
        let state = router::tests::state(dir.path()).await;

        let response = make_request(
            None,
            app(state),
            Method::GET,
            "/admin/users",
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_list_requires_admin_role() {
        let dir = tempfile::tempdir().unwrap();
        let state = router::tests::state(dir.path()).await;
        let token = state.token.create("alice").unwrap();

        let response = make_request_with(
            app(state),
            Method::GET,
            "/admin/users",
            Some(&token),
            "application/json",
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
