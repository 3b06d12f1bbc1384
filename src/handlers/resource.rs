//! Handlers shared by every resource, generic over the entity.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::config::config;
use crate::database::models::{Creatable, Resource};
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::{FilterDescriptor, FilterError, QueryOptions};
use crate::middleware::{ApiResponse, ApiResult};

pub type RepoState<T> = State<Arc<dyn Repository<T>>>;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// JSON filter descriptor
    pub filter: Option<String>,
}

impl ListQuery {
    pub fn filter_descriptor(&self) -> Result<Option<FilterDescriptor>, FilterError> {
        self.filter.as_deref().map(FilterDescriptor::parse).transpose()
    }

    pub fn options(&self) -> QueryOptions {
        QueryOptions {
            limit: config().filter.page_limit(self.limit),
            offset: self.offset.unwrap_or(0),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CountQuery {
    pub filter: Option<String>,
}

/// GET / - list with pagination and an optional filter
pub async fn list<T: Resource>(
    State(repo): RepoState<T>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<T::Dto>> {
    let filter = query.filter_descriptor()?;
    let options = query.options();

    let entities = repo.find_all(Some(&options), filter.as_ref()).await?;
    Ok(ApiResponse::success(entities.into_iter().map(Into::into).collect()))
}

/// GET /count
pub async fn count<T: Resource>(State(repo): RepoState<T>, Query(query): Query<CountQuery>) -> ApiResult<i64> {
    let filter = query.filter.as_deref().map(FilterDescriptor::parse).transpose()?;
    let count = repo.count(filter.as_ref()).await?;
    Ok(ApiResponse::success(count))
}

/// GET /:id
pub async fn show<T: Resource>(State(repo): RepoState<T>, Path(id): Path<Uuid>) -> ApiResult<T::Dto> {
    let entity = repo.find_by_id(id).await?;
    Ok(ApiResponse::success(entity.into()))
}

/// DELETE /:id
pub async fn delete<T: Resource>(State(repo): RepoState<T>, Path(id): Path<Uuid>) -> ApiResult<()> {
    repo.delete(id).await?;
    tracing::info!(resource = T::NAME, %id, "deleted");
    Ok(ApiResponse::no_content())
}

/// POST / - create from the resource's payload
pub async fn create<T: Creatable>(State(repo): RepoState<T>, Json(payload): Json<T::Payload>) -> ApiResult<T::Dto> {
    if let Err(message) = T::validate(&payload) {
        tracing::warn!(resource = T::NAME, %message, "create: validation failed");
        return Err(ApiError::validation_error(message));
    }

    let created = repo.create(&T::from_payload(payload)).await?;
    tracing::info!(resource = T::NAME, id = %created.id(), "created");
    Ok(ApiResponse::created(created.into()))
}

pub fn routes<T: Resource>() -> Router<Arc<dyn Repository<T>>> {
    Router::new()
        .route("/", get(list::<T>))
        .route("/count", get(count::<T>))
        .route("/:id", get(show::<T>).delete(delete::<T>))
}

pub fn creatable_routes<T: Creatable>() -> Router<Arc<dyn Repository<T>>> {
    routes::<T>().route("/", post(create::<T>))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_filter_means_no_restriction() {
        let query = ListQuery { filter: Some(String::new()), ..Default::default() };
        assert_eq!(query.filter_descriptor().unwrap(), Some(FilterDescriptor::default()));

        let query = ListQuery::default();
        assert_eq!(query.filter_descriptor().unwrap(), None);
    }

    #[test]
    fn malformed_filter_is_rejected() {
        let query = ListQuery { filter: Some("{\"select\": 1}".into()), ..Default::default() };
        assert!(query.filter_descriptor().is_err());
    }

    #[test]
    fn offset_defaults_to_zero() {
        let options = ListQuery { offset: None, ..Default::default() }.options();
        assert_eq!(options.offset, 0);
        assert_eq!(options.limit, config().filter.page_limit(None));
    }
}
