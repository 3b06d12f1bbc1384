//! Per-entity operations that build their own fixed filters.

pub mod post_service;
pub mod user_service;

pub use post_service::PostService;
pub use user_service::UserService;
