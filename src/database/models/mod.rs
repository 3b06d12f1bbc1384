//! Persisted entities and their HTTP-facing shapes.

use serde::{de::DeserializeOwned, Serialize};

use crate::database::schema::Entity;

pub mod organization;
pub mod post;
pub mod project;
pub mod role;
pub mod user;

pub use organization::{CreateOrganization, Organization};
pub use post::{CreatePost, Post};
pub use project::{CreateProject, Project};
pub use role::{CreateRole, Role};
pub use user::{User, UserContact, UserDto};

/// An entity exposed over HTTP. `Dto` is what clients see.
pub trait Resource: Entity {
    type Dto: Serialize + From<Self> + Send;

    /// Path segment under `/api`, also used in log lines.
    const NAME: &'static str;
}

/// A resource clients may create directly.
pub trait Creatable: Resource {
    type Payload: DeserializeOwned + Send;

    /// Returns a client-facing message when the payload is rejected.
    fn validate(payload: &Self::Payload) -> Result<(), String>;

    fn from_payload(payload: Self::Payload) -> Self;
}
