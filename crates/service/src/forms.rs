//! Post form binding and validation.
//!
//! Browsers submit `text` and `group` as urlencoded strings; an empty `group`
//! means "no group". Errors are keyed by field name so a client can show them
//! next to the matching input.

use std::collections::BTreeMap;

use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};

use models::group;
use crate::errors::ServiceError;

pub type FormErrors = BTreeMap<String, Vec<String>>;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

/// Raw submitted form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub group: Option<String>,
}

/// Form data after validation, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedPost {
    pub text: String,
    pub group_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Choice {
    pub value: i32,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: &'static str,
    pub required: bool,
    pub label: &'static str,
    pub help_text: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Choice>>,
}

/// Everything a client needs to render the create/edit form.
#[derive(Debug, Clone, Serialize)]
pub struct FormContext {
    pub fields: Vec<FieldSpec>,
    pub initial: PostForm,
    pub errors: FormErrors,
    pub is_edit: bool,
}

impl FormContext {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl PostForm {
    pub fn from_post(post: &models::post::Model) -> Self {
        Self { text: post.text.clone(), group: post.group_id.map(|g| g.to_string()) }
    }

    /// Checks that need no database: required text, numeric group id.
    fn clean_local(&self) -> (Option<String>, Option<i32>, FormErrors) {
        let mut errors = FormErrors::new();
        let text = self.text.trim();
        let text = if text.is_empty() {
            errors.entry("text".into()).or_default().push(REQUIRED.into());
            None
        } else {
            Some(text.to_string())
        };

        let group_id = match self.group.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.parse::<i32>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.entry("group".into()).or_default().push(INVALID_CHOICE.into());
                    None
                }
            },
        };
        (text, group_id, errors)
    }

    /// Validate against the database; the chosen group must exist.
    pub async fn clean(&self, db: &DatabaseConnection) -> Result<CleanedPost, ServiceError> {
        let (text, group_id, mut errors) = self.clean_local();
        if let Some(id) = group_id {
            if group::Entity::find_by_id(id).one(db).await?.is_none() {
                errors.entry("group".into()).or_default().push(INVALID_CHOICE.into());
            }
        }
        match text {
            Some(text) if errors.is_empty() => Ok(CleanedPost { text, group_id }),
            _ => Err(ServiceError::InvalidForm(errors)),
        }
    }
}

/// Build the form description with current group choices.
pub async fn form_context(
    db: &DatabaseConnection,
    initial: PostForm,
    errors: FormErrors,
    is_edit: bool,
) -> Result<FormContext, ServiceError> {
    let choices = group::list(db)
        .await?
        .into_iter()
        .map(|g| Choice { value: g.id, label: g.title })
        .collect();
    let fields = vec![
        FieldSpec {
            name: "text",
            kind: "char",
            required: true,
            label: "Text",
            help_text: "Text of the new post",
            choices: None,
        },
        FieldSpec {
            name: "group",
            kind: "choice",
            required: false,
            label: "Group",
            help_text: "Group the post belongs to",
            choices: Some(choices),
        },
    ];
    Ok(FormContext { fields, initial, errors, is_edit })
}
