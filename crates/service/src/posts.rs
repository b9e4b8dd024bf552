//! Post listings, detail, creation and editing.
//!
//! Every listing is ordered newest first and goes through the shared
//! [`Paginator`]: the raw `page` value is never trusted and never fails.

use std::collections::HashMap;

use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QuerySelect, Select,
};
use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use common::pagination::{Page, Paginator};
use models::{group, post, user};

use crate::errors::ServiceError;
use crate::forms::{form_context, FormContext, FormErrors, PostForm};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorView {
    pub id: Uuid,
    pub username: String,
}

impl From<user::Model> for AuthorView {
    fn from(u: user::Model) -> Self {
        Self { id: u.id, username: u.username }
    }
}

/// A post joined with its author and group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostView {
    pub id: i32,
    pub text: String,
    pub pub_date: sea_orm::prelude::DateTimeWithTimeZone,
    pub author: AuthorView,
    pub group: Option<group::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupPage {
    pub group: group::Model,
    pub page_obj: Page<PostView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfilePage {
    pub author: AuthorView,
    pub posts_count: usize,
    pub page_obj: Page<PostView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: PostView,
    pub author_posts_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditContext {
    pub post: PostView,
    pub form: FormContext,
}

/// Count, resolve the requested page, then fetch only that page's rows.
async fn fetch_page(
    db: &DatabaseConnection,
    select: Select<post::Entity>,
    paginator: &Paginator,
    raw_page: Option<&str>,
) -> Result<Page<PostView>, ServiceError> {
    let total = select.clone().count(db).await? as usize;
    let window = paginator.window(raw_page, total);
    debug!(total, number = window.number, offset = window.offset, limit = window.limit, "resolved page");
    if window.limit == 0 {
        return Ok(Page::from_window(window, Vec::new()));
    }
    let rows = select
        .offset(window.offset as u64)
        .limit(window.limit as u64)
        .all(db)
        .await?;
    Ok(Page::from_window(window, hydrate(db, rows).await?))
}

/// Attach authors and groups with one query each.
async fn hydrate(db: &DatabaseConnection, rows: Vec<post::Model>) -> Result<Vec<PostView>, ServiceError> {
    let author_ids: Vec<Uuid> = rows.iter().map(|p| p.author_id).collect();
    let group_ids: Vec<i32> = rows.iter().filter_map(|p| p.group_id).collect();

    let authors: HashMap<Uuid, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(author_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let groups: HashMap<i32, group::Model> = if group_ids.is_empty() {
        HashMap::new()
    } else {
        group::Entity::find()
            .filter(group::Column::Id.is_in(group_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|g| (g.id, g))
            .collect()
    };

    rows.into_iter()
        .map(|p| {
            let author = authors
                .get(&p.author_id)
                .cloned()
                .ok_or_else(|| ServiceError::Db(format!("post {} has no author row", p.id)))?;
            Ok(PostView {
                id: p.id,
                text: p.text,
                pub_date: p.pub_date,
                author: author.into(),
                group: p.group_id.and_then(|g| groups.get(&g).cloned()),
            })
        })
        .collect()
}

async fn view(db: &DatabaseConnection, post: post::Model) -> Result<PostView, ServiceError> {
    hydrate(db, vec![post])
        .await?
        .pop()
        .ok_or_else(|| ServiceError::not_found("post"))
}

/// All posts.
#[instrument(skip(db, paginator))]
pub async fn index_page(
    db: &DatabaseConnection,
    paginator: &Paginator,
    raw_page: Option<&str>,
) -> Result<Page<PostView>, ServiceError> {
    fetch_page(db, post::newest_first(), paginator, raw_page).await
}

/// Posts filed under the group with `slug`.
#[instrument(skip(db, paginator))]
pub async fn group_page(
    db: &DatabaseConnection,
    slug: &str,
    paginator: &Paginator,
    raw_page: Option<&str>,
) -> Result<GroupPage, ServiceError> {
    let group = group::find_by_slug(db, slug)
        .await?
        .ok_or_else(|| ServiceError::not_found("group"))?;
    let select = post::newest_first().filter(post::Column::GroupId.eq(group.id));
    let page_obj = fetch_page(db, select, paginator, raw_page).await?;
    Ok(GroupPage { group, page_obj })
}

/// Posts written by `username`.
#[instrument(skip(db, paginator))]
pub async fn profile_page(
    db: &DatabaseConnection,
    username: &str,
    paginator: &Paginator,
    raw_page: Option<&str>,
) -> Result<ProfilePage, ServiceError> {
    let author = user::find_by_username(db, username)
        .await?
        .ok_or_else(|| ServiceError::not_found("user"))?;
    let select = post::newest_first().filter(post::Column::AuthorId.eq(author.id));
    let page_obj = fetch_page(db, select, paginator, raw_page).await?;
    Ok(ProfilePage { author: author.into(), posts_count: page_obj.count, page_obj })
}

#[instrument(skip(db))]
pub async fn post_detail(db: &DatabaseConnection, post_id: i32) -> Result<PostDetail, ServiceError> {
    let found = post::Entity::find_by_id(post_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("post"))?;
    let author_posts_count = post::Entity::find()
        .filter(post::Column::AuthorId.eq(found.author_id))
        .count(db)
        .await?;
    Ok(PostDetail { post: view(db, found).await?, author_posts_count })
}

/// Validate `form` and publish a post as `author_id`.
#[instrument(skip(db, form))]
pub async fn create_post(
    db: &DatabaseConnection,
    author_id: Uuid,
    form: &PostForm,
) -> Result<post::Model, ServiceError> {
    let cleaned = form.clean(db).await?;
    let created = post::create(db, author_id, &cleaned.text, cleaned.group_id).await?;
    info!(post_id = created.id, group_id = ?created.group_id, "post_created");
    Ok(created)
}

/// Load a post that `editor_id` is allowed to change.
async fn owned_post(db: &DatabaseConnection, post_id: i32, editor_id: Uuid) -> Result<post::Model, ServiceError> {
    let found = post::Entity::find_by_id(post_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("post"))?;
    if found.author_id != editor_id {
        return Err(ServiceError::Forbidden(format!("post {} belongs to another author", post_id)));
    }
    Ok(found)
}

/// Form prefilled with the current content, for the author only.
#[instrument(skip(db))]
pub async fn edit_context(
    db: &DatabaseConnection,
    post_id: i32,
    editor_id: Uuid,
) -> Result<EditContext, ServiceError> {
    let found = owned_post(db, post_id, editor_id).await?;
    let form = form_context(db, PostForm::from_post(&found), FormErrors::new(), true).await?;
    Ok(EditContext { post: view(db, found).await?, form })
}

/// Apply `form` to a post owned by `editor_id`. Author and date stay unchanged.
#[instrument(skip(db, form))]
pub async fn edit_post(
    db: &DatabaseConnection,
    post_id: i32,
    editor_id: Uuid,
    form: &PostForm,
) -> Result<post::Model, ServiceError> {
    owned_post(db, post_id, editor_id).await?;
    let cleaned = form.clean(db).await?;
    let updated = post::update_content(db, post_id, &cleaned.text, cleaned.group_id).await?;
    info!(post_id = updated.id, "post_edited");
    Ok(updated)
}

/// Number of posts per group id, for group listings.
pub async fn counts_by_group(db: &DatabaseConnection) -> Result<HashMap<i32, i64>, ServiceError> {
    let rows: Vec<(Option<i32>, i64)> = post::Entity::find()
        .select_only()
        .column(post::Column::GroupId)
        .column_as(Expr::col(post::Column::Id).count(), "n")
        .filter(post::Column::GroupId.is_not_null())
        .group_by(post::Column::GroupId)
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows.into_iter().filter_map(|(g, n)| g.map(|g| (g, n))).collect())
}
