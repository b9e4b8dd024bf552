use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use models::group;
use crate::errors::ServiceError;
use crate::posts::counts_by_group;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupInput {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    #[serde(flatten)]
    pub group: group::Model,
    pub posts_count: i64,
}

/// Create a group; slugs are unique.
#[instrument(skip(db, input), fields(slug = %input.slug))]
pub async fn create_group(db: &DatabaseConnection, input: GroupInput) -> Result<group::Model, ServiceError> {
    group::validate_title(&input.title)?;
    group::validate_slug(&input.slug)?;
    if group::find_by_slug(db, &input.slug).await?.is_some() {
        return Err(ServiceError::Validation(format!("slug '{}' already taken", input.slug)));
    }
    let created = group::create(db, &input.title, &input.slug, &input.description).await?;
    info!(group_id = created.id, "group_created");
    Ok(created)
}

/// All groups by title, with how many posts each holds.
pub async fn list_groups(db: &DatabaseConnection) -> Result<Vec<GroupSummary>, ServiceError> {
    let counts = counts_by_group(db).await?;
    let groups = group::list(db).await?;
    Ok(groups
        .into_iter()
        .map(|g| {
            let posts_count = counts.get(&g.id).copied().unwrap_or(0);
            GroupSummary { group: g, posts_count }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;

    fn input(title: &str, slug: &str) -> GroupInput {
        GroupInput { title: title.into(), slug: slug.into(), description: "Test description".into() }
    }

    #[tokio::test]
    async fn group_create_and_list() -> anyhow::Result<()> {
        let db = get_db().await?;
        let g = create_group(&db, input("Test group", "test_group_slug")).await?;
        let author = models::user::create(&db, "PostAuthor", "a@example.com").await?;
        models::post::create(&db, author.id, "hello", Some(g.id)).await?;

        let listed = list_groups(&db).await?;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].group.slug, "test_group_slug");
        assert_eq!(listed[0].posts_count, 1);
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_or_bad_slug_is_rejected() -> anyhow::Result<()> {
        let db = get_db().await?;
        create_group(&db, input("One", "same")).await?;
        assert!(matches!(create_group(&db, input("Two", "same")).await, Err(ServiceError::Validation(_))));
        assert!(matches!(create_group(&db, input("Three", "has space")).await, Err(ServiceError::Model(_))));
        Ok(())
    }
}
