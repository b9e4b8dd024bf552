use axum::{extract::State, http::StatusCode, Json};

use models::group;
use service::groups::{self, GroupInput, GroupSummary};

use crate::errors::JsonApiError;
use crate::routes::auth::{CurrentUser, ServerState};

#[utoipa::path(get, path = "/admin/groups", tag = "admin", responses((status = 200, description = "OK"), (status = 303, description = "Login required")))]
pub async fn list(
    _user: CurrentUser,
    State(state): State<ServerState>,
) -> Result<Json<Vec<GroupSummary>>, JsonApiError> {
    Ok(Json(groups::list_groups(&state.db).await?))
}

#[utoipa::path(post, path = "/admin/groups", tag = "admin", request_body = crate::openapi::GroupRequest, responses((status = 201, description = "Created"), (status = 400, description = "Bad Request")))]
pub async fn create(
    user: CurrentUser,
    State(state): State<ServerState>,
    Json(input): Json<GroupInput>,
) -> Result<(StatusCode, Json<group::Model>), JsonApiError> {
    tracing::info!(by = %user.username, slug = %input.slug, "group create requested");
    let created = groups::create_group(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
