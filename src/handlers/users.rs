use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use uuid::Uuid;

use super::resource;
use crate::database::models::{User, UserContact};
use crate::database::Repository;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::UserService;

/// GET /api/users/:id/contact
pub async fn contact(State(service): State<UserService>, Path(id): Path<Uuid>) -> ApiResult<UserContact> {
    let contact = service.contact_info(id).await?;
    Ok(ApiResponse::success(contact))
}

/// Users are read and deleted here but never created; registration lives elsewhere.
pub fn routes(repo: Arc<dyn Repository<User>>) -> Router {
    let extra = Router::new()
        .route("/:id/contact", get(contact))
        .with_state(UserService::new(repo.clone()));

    resource::routes::<User>().with_state(repo).merge(extra)
}
