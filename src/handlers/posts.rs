use std::sync::Arc;

use axum::{extract::State, routing::get, Router};

use super::resource;
use crate::database::models::Post;
use crate::database::Repository;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::PostService;

/// GET /api/posts/published
pub async fn published(State(service): State<PostService>) -> ApiResult<Vec<Post>> {
    let posts = service.published().await?;
    Ok(ApiResponse::success(posts))
}

pub fn routes(repo: Arc<dyn Repository<Post>>) -> Router {
    let extra = Router::new()
        .route("/published", get(published))
        .with_state(PostService::new(repo.clone()));

    resource::creatable_routes::<Post>().with_state(repo).merge(extra)
}
