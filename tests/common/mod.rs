#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crud_backend::database::models::{Organization, Post, Project, Role, User};
use crud_backend::config::{config, DatabaseConfig};
use crud_backend::database::{DatabaseError, DatabaseManager, Entity, Repository};
use crud_backend::filter::filter_where::Predicate;
use crud_backend::filter::{FilterDescriptor, Operator, QueryOptions, SelectQuery};
use crud_backend::handlers::{self, Repositories};

/// Vec-backed repository that records what it was asked for.
///
/// Only `=` conditions are evaluated against stored rows; everything else the compiler keeps
/// is recorded but does not narrow results.
pub struct MemoryRepository<T> {
    rows: Mutex<Vec<T>>,
    pub last_filter: Mutex<Option<FilterDescriptor>>,
    pub last_options: Mutex<Option<QueryOptions>>,
}

impl<T: Entity + Clone> MemoryRepository<T> {
    pub fn new() -> Self {
        Self::with_rows(vec![])
    }

    pub fn with_rows(rows: Vec<T>) -> Self {
        Self {
            rows: Mutex::new(rows),
            last_filter: Mutex::new(None),
            last_options: Mutex::new(None),
        }
    }

    pub fn rows(&self) -> Vec<T> {
        self.rows.lock().unwrap().clone()
    }

    pub fn last_filter(&self) -> Option<FilterDescriptor> {
        self.last_filter.lock().unwrap().clone()
    }

    pub fn last_options(&self) -> Option<QueryOptions> {
        *self.last_options.lock().unwrap()
    }

    fn matches(row: &T, predicates: &[Predicate<'_>]) -> bool {
        let Ok(Value::Object(fields)) = serde_json::to_value(row) else { return false };
        predicates.iter().all(|p| match p {
            Predicate::Compare { column, operator: Operator::Eq, value } => {
                let stored = fields.get(column.field).cloned().unwrap_or(Value::Null);
                match (&stored, value) {
                    (Value::String(a), Value::String(b)) => a.eq_ignore_ascii_case(b),
                    (a, b) => a == b,
                }
            }
            _ => true,
        })
    }
}

#[async_trait]
impl<T: Entity + Clone> Repository<T> for MemoryRepository<T> {
    async fn create(&self, entity: &T) -> Result<T, DatabaseError> {
        let mut value = serde_json::to_value(entity)?;
        if entity.id().is_nil() {
            value["id"] = Value::String(Uuid::new_v4().to_string());
        }
        let stored: T = serde_json::from_value(value)?;
        self.rows.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<T, DatabaseError> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id() == id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {} not found", T::schema().table(), id)))
    }

    async fn find_all(
        &self,
        options: Option<&QueryOptions>,
        filter: Option<&FilterDescriptor>,
    ) -> Result<Vec<T>, DatabaseError> {
        *self.last_filter.lock().unwrap() = filter.cloned();
        *self.last_options.lock().unwrap() = options.copied();

        let query = SelectQuery::new(T::schema()).apply_pagination(options).compile(filter);
        let rows: Vec<T> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| Self::matches(r, query.predicates()))
            .skip(query.offset().unwrap_or(0) as usize)
            .cloned()
            .collect();

        Ok(match query.limit() {
            Some(limit) => rows.into_iter().take(limit as usize).collect(),
            None => rows,
        })
    }

    async fn count(&self, filter: Option<&FilterDescriptor>) -> Result<i64, DatabaseError> {
        *self.last_filter.lock().unwrap() = filter.cloned();
        let query = SelectQuery::new(T::schema()).compile(filter);
        let n = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| Self::matches(r, query.predicates()))
            .count();
        Ok(n as i64)
    }

    async fn update(&self, entity: &T) -> Result<(), DatabaseError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|r| r.id() == entity.id()) {
            Some(row) => {
                *row = entity.clone();
                Ok(())
            }
            None => Err(DatabaseError::NotFound(format!("{} not found", entity.id()))),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.id() != id);
        if rows.len() == before {
            return Err(DatabaseError::NotFound(format!("{} not found", id)));
        }
        Ok(())
    }

    async fn exists(&self, id: Uuid) -> Result<bool, DatabaseError> {
        Ok(self.rows.lock().unwrap().iter().any(|r| r.id() == id))
    }
}

/// In-memory repositories for every resource, with handles kept for assertions.
pub struct MemoryStore {
    pub users: Arc<MemoryRepository<User>>,
    pub roles: Arc<MemoryRepository<Role>>,
    pub posts: Arc<MemoryRepository<Post>>,
    pub organizations: Arc<MemoryRepository<Organization>>,
    pub projects: Arc<MemoryRepository<Project>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: Arc::new(MemoryRepository::new()),
            roles: Arc::new(MemoryRepository::new()),
            posts: Arc::new(MemoryRepository::new()),
            organizations: Arc::new(MemoryRepository::new()),
            projects: Arc::new(MemoryRepository::new()),
        }
    }

    /// The pool points at a closed port; only `/health` ever touches it.
    pub fn repositories(&self) -> Result<Repositories> {
        let unreachable = DatabaseConfig {
            url: Some("postgres://postgres@127.0.0.1:1/unused".to_string()),
            max_connections: 1,
            connection_timeout: 1,
            ..config().database.clone()
        };
        let pool = DatabaseManager::connect_lazy(&unreachable)?;

        Ok(Repositories {
            pool,
            users: self.users.clone(),
            roles: self.roles.clone(),
            posts: self.posts.clone(),
            organizations: self.organizations.clone(),
            projects: self.projects.clone(),
        })
    }
}

/// Serves the router on an ephemeral port and returns its base URL.
pub async fn spawn_app(repos: Repositories) -> Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, handlers::router(repos)).await;
    });
    Ok(format!("http://{}", addr))
}

/// Set when a PostgreSQL instance is available for the repository tests.
pub fn database_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok().filter(|s| !s.trim().is_empty())
}
