//! Safe translation of client filter descriptors into parameterized SQL.
//!
//! Every identifier that reaches SQL text is either taken from an [`EntitySchema`]
//! or checked against a fixed allowlist; every value is bound as a parameter.
//!
//! [`EntitySchema`]: crate::database::schema::EntitySchema

pub mod error;
pub mod filter;
pub mod filter_order;
pub mod filter_where;
pub mod types;
pub mod validate;

pub use error::FilterError;
pub use filter::SelectQuery;
pub use types::*;
