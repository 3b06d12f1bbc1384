use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Creatable, Organization, Resource};
use crate::database::schema::{Entity, EntitySchema, SqlType};

static SCHEMA: Lazy<EntitySchema> = Lazy::new(|| {
    EntitySchema::builder("projects")
        .field("id", SqlType::Uuid).primary_key()
        .field("organization_id", SqlType::Uuid)
        .field("name", SqlType::Text)
        .field("description", SqlType::Text)
        .field("created_at", SqlType::Timestamptz).store_assigned()
        .field("updated_at", SqlType::Timestamptz).touch_on_update()
        .relation("organization")
        .build()
});

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<Box<Organization>>,
}

impl Entity for Project {
    fn schema() -> &'static EntitySchema {
        &SCHEMA
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Resource for Project {
    type Dto = Project;
    const NAME: &'static str = "projects";
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub organization_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

impl Creatable for Project {
    type Payload = CreateProject;

    fn validate(payload: &CreateProject) -> Result<(), String> {
        if payload.organization_id.is_nil() {
            return Err("organization_id is required".to_string());
        }
        if payload.name.trim().is_empty() {
            return Err("name is required".to_string());
        }
        Ok(())
    }

    fn from_payload(payload: CreateProject) -> Self {
        Self {
            organization_id: payload.organization_id,
            name: payload.name.trim().to_string(),
            description: payload.description,
            ..Default::default()
        }
    }
}
