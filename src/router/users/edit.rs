//! Show and submit the edit form of a user.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::{ValidationError, ValidationErrors};
use zeroize::Zeroizing;

use crate::admin::{EditOutcome, EditRequest, Photo, UserForm};
use crate::error::Result;
use crate::user::User;
use crate::{AppState, ServerError};

const DIRECTORY: &str = "/admin/users";

/// State of the form after a submission.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub user: Option<User>,
    pub errors: Vec<String>,
}

/// Current values of the user.
pub async fn form(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserForm>> {
    state
        .panel
        .edit_form(&user_id)
        .await
        .map(Json)
        .ok_or(ServerError::UserNotFound)
}

/// Back to the directory once the user is updated. Otherwise the form is
/// answered with its errors.
pub async fn handler(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(user_id): Path<String>,
    multipart: Multipart,
) -> Result<axum::response::Response> {
    let request =
        read_form(user_id, multipart, state.config.max_upload_size).await?;
    tracing::info!(admin_id = %admin.id, user_id = %request.id, "user edit submitted");
    let outcome = state.panel.edit_user(request).await;

    let status = match &outcome {
        EditOutcome::Updated(_) => {
            return Ok(Redirect::to(DIRECTORY).into_response());
        },
        EditOutcome::Rejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        EditOutcome::NotFound => StatusCode::NOT_FOUND,
    };

    Ok((
        status,
        Json(Response {
            errors: outcome.errors(),
            user: outcome.user().cloned(),
        }),
    )
        .into_response())
}

fn photo_too_large(limit: usize) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        "photo",
        ValidationError::new("photo").with_message(
            format!("Photo must not exceed {limit} bytes.").into(),
        ),
    );
    errors
}

/// Collect multipart fields into an [`EditRequest`].
///
/// A file input left empty is sent without name nor content and means
/// "no photo". An empty file that carries a name is still a photo.
async fn read_form(
    id: String,
    mut multipart: Multipart,
    max_upload_size: usize,
) -> Result<EditRequest> {
    let mut request = EditRequest {
        id,
        ..Default::default()
    };

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();

        match name.as_str() {
            "email" => request.email = field.text().await?,
            "userName" | "username" => request.username = field.text().await?,
            "oldPassword" => {
                request.old_password = Zeroizing::new(field.text().await?)
            },
            "newPassword" => {
                request.new_password = Zeroizing::new(field.text().await?)
            },
            "photo" => {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let bytes = field.bytes().await?;

                if bytes.len() > max_upload_size {
                    return Err(photo_too_large(max_upload_size).into());
                }
                if !file_name.is_empty() || !bytes.is_empty() {
                    request.photo = Some(Photo {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            },
            _ => tracing::debug!(field = %name, "unknown form field ignored"),
        }
    }

    Ok(request)
}
