use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Creatable, Resource};
use crate::database::schema::{Entity, EntitySchema, SqlType};

static SCHEMA: Lazy<EntitySchema> = Lazy::new(|| {
    EntitySchema::builder("roles")
        .field("id", SqlType::Uuid).primary_key()
        .field("name", SqlType::Text)
        .build()
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
}

impl Entity for Role {
    fn schema() -> &'static EntitySchema {
        &SCHEMA
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Resource for Role {
    type Dto = Role;
    const NAME: &'static str = "roles";
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRole {
    pub name: String,
}

impl Creatable for Role {
    type Payload = CreateRole;

    fn validate(payload: &CreateRole) -> Result<(), String> {
        match payload.name.trim().len() {
            0 => Err("name is required".to_string()),
            1..=32 => Ok(()),
            _ => Err("name must be at most 32 characters".to_string()),
        }
    }

    fn from_payload(payload: CreateRole) -> Self {
        Self {
            id: Uuid::nil(),
            name: payload.name.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_required_and_bounded() {
        assert!(Role::validate(&CreateRole { name: "  ".into() }).is_err());
        assert!(Role::validate(&CreateRole { name: "x".repeat(33) }).is_err());
        assert!(Role::validate(&CreateRole { name: "admin".into() }).is_ok());
    }
}
