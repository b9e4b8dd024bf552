//! Post listings, detail, and the create/edit form endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};

use common::{types::PageQuery, Page};
use service::errors::ServiceError;
use service::forms::{form_context, FormErrors, PostForm};
use service::posts::{self, EditContext, GroupPage, PostDetail, PostView, ProfilePage};

use crate::errors::JsonApiError;
use crate::observability::{PAGE_REQUESTS_TOTAL, POSTS_CREATED_TOTAL, POSTS_EDITED_TOTAL};
use crate::routes::auth::{CurrentUser, ServerState};

fn profile_url(username: &str) -> String {
    format!("/profile/{username}/")
}

fn detail_url(post_id: i32) -> String {
    format!("/posts/{post_id}/")
}

/// Re-render the form with its errors as a 400 response.
async fn invalid_form(
    state: &ServerState,
    form: PostForm,
    errors: FormErrors,
    is_edit: bool,
) -> Result<Response, JsonApiError> {
    let ctx = form_context(&state.db, form, errors, is_edit).await?;
    Ok((StatusCode::BAD_REQUEST, Json(ctx)).into_response())
}

#[utoipa::path(get, path = "/", tag = "posts", params(("page" = Option<String>, Query, description = "Page number")), responses((status = 200, description = "Latest posts")))]
pub async fn index(
    State(state): State<ServerState>,
    Query(q): Query<PageQuery>,
) -> Result<Json<Page<PostView>>, JsonApiError> {
    PAGE_REQUESTS_TOTAL.with_label_values(&["index"]).inc();
    let page = posts::index_page(&state.db, &state.paginator, q.raw()).await?;
    Ok(Json(page))
}

#[utoipa::path(get, path = "/group/{slug}/", tag = "posts", params(("slug" = String, Path, description = "Group slug"), ("page" = Option<String>, Query, description = "Page number")), responses((status = 200, description = "Group posts"), (status = 404, description = "Unknown group")))]
pub async fn group_list(
    State(state): State<ServerState>,
    Path(slug): Path<String>,
    Query(q): Query<PageQuery>,
) -> Result<Json<GroupPage>, JsonApiError> {
    PAGE_REQUESTS_TOTAL.with_label_values(&["group"]).inc();
    let page = posts::group_page(&state.db, &slug, &state.paginator, q.raw()).await?;
    Ok(Json(page))
}

#[utoipa::path(get, path = "/profile/{username}/", tag = "posts", params(("username" = String, Path, description = "Author username"), ("page" = Option<String>, Query, description = "Page number")), responses((status = 200, description = "Author posts"), (status = 404, description = "Unknown author")))]
pub async fn profile(
    State(state): State<ServerState>,
    Path(username): Path<String>,
    Query(q): Query<PageQuery>,
) -> Result<Json<ProfilePage>, JsonApiError> {
    PAGE_REQUESTS_TOTAL.with_label_values(&["profile"]).inc();
    let page = posts::profile_page(&state.db, &username, &state.paginator, q.raw()).await?;
    Ok(Json(page))
}

#[utoipa::path(get, path = "/posts/{post_id}/", tag = "posts", params(("post_id" = i32, Path, description = "Post id")), responses((status = 200, description = "Post"), (status = 404, description = "Unknown post")))]
pub async fn post_detail(
    State(state): State<ServerState>,
    Path(post_id): Path<i32>,
) -> Result<Json<PostDetail>, JsonApiError> {
    Ok(Json(posts::post_detail(&state.db, post_id).await?))
}

pub async fn create_form(
    user: CurrentUser,
    State(state): State<ServerState>,
) -> Result<Response, JsonApiError> {
    tracing::debug!(username = %user.username, "create form requested");
    let ctx = form_context(&state.db, PostForm::default(), FormErrors::new(), false).await?;
    Ok(Json(ctx).into_response())
}

#[utoipa::path(post, path = "/create/", tag = "posts", responses((status = 303, description = "Created, redirect to profile"), (status = 400, description = "Invalid form")))]
pub async fn create(
    user: CurrentUser,
    State(state): State<ServerState>,
    Form(form): Form<PostForm>,
) -> Result<Response, JsonApiError> {
    match posts::create_post(&state.db, user.id, &form).await {
        Ok(_) => {
            POSTS_CREATED_TOTAL.inc();
            Ok(Redirect::to(&profile_url(&user.username)).into_response())
        }
        Err(ServiceError::InvalidForm(errors)) => invalid_form(&state, form, errors, false).await,
        Err(e) => Err(e.into()),
    }
}

pub async fn edit_form(
    user: CurrentUser,
    State(state): State<ServerState>,
    Path(post_id): Path<i32>,
) -> Result<Response, JsonApiError> {
    match posts::edit_context(&state.db, post_id, user.id).await {
        Ok(ctx) => Ok(Json::<EditContext>(ctx).into_response()),
        Err(ServiceError::Forbidden(_)) => Ok(Redirect::to(&detail_url(post_id)).into_response()),
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(post, path = "/posts/{post_id}/edit/", tag = "posts", params(("post_id" = i32, Path, description = "Post id")), responses((status = 303, description = "Saved, redirect to post"), (status = 400, description = "Invalid form"), (status = 404, description = "Unknown post")))]
pub async fn edit(
    user: CurrentUser,
    State(state): State<ServerState>,
    Path(post_id): Path<i32>,
    Form(form): Form<PostForm>,
) -> Result<Response, JsonApiError> {
    match posts::edit_post(&state.db, post_id, user.id, &form).await {
        Ok(_) => {
            POSTS_EDITED_TOTAL.inc();
            Ok(Redirect::to(&detail_url(post_id)).into_response())
        }
        Err(ServiceError::Forbidden(_)) => Ok(Redirect::to(&detail_url(post_id)).into_response()),
        Err(ServiceError::InvalidForm(errors)) => invalid_form(&state, form, errors, true).await,
        Err(e) => Err(e.into()),
    }
}
