//! Admin users HTTP API.
mod delete;
mod edit;
mod list;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Router, middleware};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::middleware::require_admin;
use crate::user::User;

/// Extra room for multipart boundaries and text fields.
const FORM_OVERHEAD: usize = 64 * 1024;

/// User directory with the messages produced by the last action.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Directory {
    pub users: Vec<User>,
    pub errors: Vec<String>,
}

pub fn router(state: AppState) -> Router<AppState> {
    let body_limit = state.config.max_upload_size + FORM_OVERHEAD;

    Router::new()
        // `GET /admin/users` goes to `list`.
        .route("/", get(list::handler))
        // `POST /admin/users/delete` goes to `delete`.
        .route("/delete", post(delete::handler))
        // `GET /admin/users/{ID}` shows the form, `POST` submits it.
        .route("/{user_id}", get(edit::form).post(edit::handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}
