use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Post, Resource, Role};
use crate::database::schema::{Entity, EntitySchema, SqlType};

static SCHEMA: Lazy<EntitySchema> = Lazy::new(|| {
    EntitySchema::builder("users")
        .field("id", SqlType::Uuid).primary_key()
        .field("role_id", SqlType::Uuid)
        .field("first_name", SqlType::Text)
        .field("last_name", SqlType::Text)
        .field("email", SqlType::Text)
        .field("password", SqlType::Text)
        .field("phone", SqlType::Text)
        .field("is_active", SqlType::Boolean)
        .field("created_at", SqlType::Timestamptz).store_assigned()
        .field("updated_at", SqlType::Timestamptz).touch_on_update()
        .relation("role")
        .relation("posts")
        .build()
});

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: Uuid,
    /// `None` is a regular user.
    pub role_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Stored hash; never leaves the service.
    pub password: String,
    pub phone: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub posts: Vec<Post>,
}

impl Entity for User {
    fn schema() -> &'static EntitySchema {
        &SCHEMA
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub id: Uuid,
    pub role_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            role_id: user.role_id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone: user.phone,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl Resource for User {
    type Dto = UserDto;
    const NAME: &'static str = "users";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContact {
    pub phone: String,
}
