use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Creatable, Resource, User};
use crate::database::schema::{Entity, EntitySchema, SqlType};

static SCHEMA: Lazy<EntitySchema> = Lazy::new(|| {
    EntitySchema::builder("posts")
        .field("id", SqlType::Uuid).primary_key()
        .field("title", SqlType::Text)
        .field("content", SqlType::Text)
        .field("published", SqlType::Boolean)
        .field("created_at", SqlType::Timestamptz).store_assigned()
        .field("updated_at", SqlType::Timestamptz).touch_on_update()
        .field_as("author_id", "user_id", SqlType::Uuid)
        .relation("user")
        .build()
});

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Stored as `user_id`.
    pub author_id: Uuid,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Box<User>>,
}

impl Entity for Post {
    fn schema() -> &'static EntitySchema {
        &SCHEMA
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Resource for Post {
    type Dto = Post;
    const NAME: &'static str = "posts";
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePost {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub published: bool,
    pub author_id: Uuid,
}

impl Creatable for Post {
    type Payload = CreatePost;

    fn validate(payload: &CreatePost) -> Result<(), String> {
        let len = payload.title.chars().count();
        if !(1..=255).contains(&len) {
            return Err("title must be between 1 and 255 characters".to_string());
        }
        if payload.author_id.is_nil() {
            return Err("author_id is required".to_string());
        }
        Ok(())
    }

    fn from_payload(payload: CreatePost) -> Self {
        Self {
            title: payload.title,
            content: payload.content,
            published: payload.published,
            author_id: payload.author_id,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_is_addressed_by_column_name() {
        let schema = Post::schema();
        assert_eq!(schema.column("user_id").map(|c| c.field), Some("author_id"));
        assert!(schema.column("author_id").is_none());
        assert!(schema.column("user").is_none());
    }

    #[test]
    fn title_length_is_checked() {
        let payload = |title: &str| CreatePost {
            title: title.to_string(),
            content: String::new(),
            published: false,
            author_id: Uuid::new_v4(),
        };
        assert!(Post::validate(&payload("")).is_err());
        assert!(Post::validate(&payload(&"t".repeat(256))).is_err());
        assert!(Post::validate(&payload("Hello")).is_ok());
    }
}
