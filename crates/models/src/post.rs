use sea_orm::{entity::prelude::*, Set, DatabaseConnection, QueryOrder, Select};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{errors, group, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_type = "Text")]
    pub text: String,
    pub pub_date: DateTimeWithTimeZone,
    pub author_id: Uuid,
    pub group_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Author,
    Group,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Author => Entity::belongs_to(user::Entity)
                .from(Column::AuthorId)
                .to(user::Column::Id)
                .into(),
            Relation::Group => Entity::belongs_to(group::Entity)
                .from(Column::GroupId)
                .to(group::Column::Id)
                .into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::Author.def() }
}

impl Related<group::Entity> for Entity {
    fn to() -> RelationDef { Relation::Group.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_text(text: &str) -> Result<(), errors::ModelError> {
    if text.trim().is_empty() { return Err(errors::ModelError::Validation("text required".into())); }
    Ok(())
}

/// Newest first; id breaks ties between posts created in the same instant.
pub fn newest_first() -> Select<Entity> {
    Entity::find()
        .order_by_desc(Column::PubDate)
        .order_by_desc(Column::Id)
}

pub async fn create(db: &DatabaseConnection, author_id: Uuid, text: &str, group_id: Option<i32>) -> Result<Model, errors::ModelError> {
    validate_text(text)?;
    let am = ActiveModel {
        text: Set(text.to_string()),
        pub_date: Set(Utc::now().into()),
        author_id: Set(author_id),
        group_id: Set(group_id),
        ..Default::default()
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Replace text and group; author and publication date are kept.
pub async fn update_content(db: &DatabaseConnection, id: i32, text: &str, group_id: Option<i32>) -> Result<Model, errors::ModelError> {
    validate_text(text)?;
    let mut found: ActiveModel = Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| errors::ModelError::Validation("post not found".into()))?
        .into();
    found.text = Set(text.to_string());
    found.group_id = Set(group_id);
    Ok(found.update(db).await?)
}
