pub mod manager;
pub mod migrate;
pub mod models;
pub mod query_builder;
pub mod repository;
pub mod schema;

pub use manager::{quote_identifier, DatabaseError, DatabaseManager};
pub use repository::{PgRepository, Repository};
pub use schema::{Entity, EntitySchema};
