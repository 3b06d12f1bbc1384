//! HTTP surface: one nested router per resource under `/api`, plus health.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::database::models::{Organization, Post, Project, Role, User};
use crate::database::{DatabaseManager, PgRepository, Repository};

pub mod posts;
pub mod resource;
pub mod users;

/// One repository per resource. Tests swap in other implementations.
#[derive(Clone)]
pub struct Repositories {
    pub pool: PgPool,
    pub users: Arc<dyn Repository<User>>,
    pub roles: Arc<dyn Repository<Role>>,
    pub posts: Arc<dyn Repository<Post>>,
    pub organizations: Arc<dyn Repository<Organization>>,
    pub projects: Arc<dyn Repository<Project>>,
}

impl Repositories {
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgRepository::<User>::new(pool.clone())),
            roles: Arc::new(PgRepository::<Role>::new(pool.clone())),
            posts: Arc::new(PgRepository::<Post>::new(pool.clone())),
            organizations: Arc::new(PgRepository::<Organization>::new(pool.clone())),
            projects: Arc::new(PgRepository::<Project>::new(pool.clone())),
            pool,
        }
    }
}

pub fn router(repos: Repositories) -> Router {
    let health = Router::new()
        .route("/health", get(health))
        .with_state(repos.pool);

    Router::new()
        .route("/", get(root))
        .nest("/api/users", users::routes(repos.users))
        .nest("/api/roles", resource::creatable_routes::<Role>().with_state(repos.roles))
        .nest("/api/posts", posts::routes(repos.posts))
        .nest(
            "/api/organizations",
            resource::creatable_routes::<Organization>().with_state(repos.organizations),
        )
        .nest("/api/projects", resource::creatable_routes::<Project>().with_state(repos.projects))
        .merge(health)
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "resources": ["users", "roles", "posts", "organizations", "projects"],
        }
    }))
}

async fn health(State(pool): State<PgPool>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
