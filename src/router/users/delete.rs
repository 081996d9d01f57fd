//! Delete selected users.

use std::collections::HashSet;

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Directory;
use crate::AppState;
use crate::router::Valid;
use crate::user::User;

#[derive(Debug, Default, Validate, Serialize, Deserialize)]
pub struct Body {
    #[serde(default)]
    #[validate(length(max = 1000, message = "Too many users selected."))]
    selected: HashSet<String>,
}

/// Returns the remaining users along with deletion errors.
pub async fn handler(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Valid(body): Valid<Body>,
) -> Json<Directory> {
    tracing::info!(admin_id = %admin.id, selected = body.selected.len(), "user deletion requested");
    let errors = state.panel.delete_users(&body.selected).await;

    Json(Directory {
        users: state.panel.list_users().await,
        errors,
    })
}
