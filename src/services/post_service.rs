use std::sync::Arc;

use crate::database::models::Post;
use crate::database::{DatabaseError, Repository};
use crate::filter::{FilterDescriptor, QueryOptions};

/// Page size of the published feed.
pub const PUBLISHED_LIMIT: i64 = 10;

#[derive(Clone)]
pub struct PostService {
    repository: Arc<dyn Repository<Post>>,
}

impl PostService {
    pub fn new(repository: Arc<dyn Repository<Post>>) -> Self {
        Self { repository }
    }

    pub async fn published(&self) -> Result<Vec<Post>, DatabaseError> {
        let options = QueryOptions {
            limit: PUBLISHED_LIMIT,
            offset: 0,
        };
        let filter = FilterDescriptor::where_eq("published", true);
        self.repository.find_all(Some(&options), Some(&filter)).await
    }
}
