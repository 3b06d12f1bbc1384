use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Creatable, Project, Resource};
use crate::database::schema::{Entity, EntitySchema, SqlType};

static SCHEMA: Lazy<EntitySchema> = Lazy::new(|| {
    EntitySchema::builder("organizations")
        .field("id", SqlType::Uuid).primary_key()
        .field("name", SqlType::Text)
        .field("slug", SqlType::Text)
        .field("created_at", SqlType::Timestamptz).store_assigned()
        .field("updated_at", SqlType::Timestamptz).touch_on_update()
        .relation("projects")
        .build()
});

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<Project>,
}

impl Entity for Organization {
    fn schema() -> &'static EntitySchema {
        &SCHEMA
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Resource for Organization {
    type Dto = Organization;
    const NAME: &'static str = "organizations";
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrganization {
    pub name: String,
    pub slug: String,
}

impl Creatable for Organization {
    type Payload = CreateOrganization;

    fn validate(payload: &CreateOrganization) -> Result<(), String> {
        if payload.name.trim().is_empty() {
            return Err("name is required".to_string());
        }
        let slug_ok = !payload.slug.is_empty()
            && payload.slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !slug_ok {
            return Err("slug must be lowercase letters, digits and dashes".to_string());
        }
        Ok(())
    }

    fn from_payload(payload: CreateOrganization) -> Self {
        Self {
            name: payload.name.trim().to_string(),
            slug: payload.slug,
            ..Default::default()
        }
    }
}
