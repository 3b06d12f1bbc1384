use std::sync::Arc;

use uuid::Uuid;

use crate::database::models::{User, UserContact};
use crate::database::{DatabaseError, Repository};
use crate::filter::FilterDescriptor;

#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn Repository<User>>,
}

impl UserService {
    pub fn new(repository: Arc<dyn Repository<User>>) -> Self {
        Self { repository }
    }

    /// Only the phone column is read.
    pub async fn contact_info(&self, id: Uuid) -> Result<UserContact, DatabaseError> {
        let filter = FilterDescriptor {
            select: vec!["phone".to_string()],
            ..FilterDescriptor::where_eq("id", id.to_string())
        };
        let users = self.repository.find_all(None, Some(&filter)).await?;

        users
            .into_iter()
            .next()
            .map(|user| UserContact { phone: user.phone })
            .ok_or_else(|| DatabaseError::NotFound(format!("User with ID {} not found", id)))
    }
}
