//! Activity log service

use crate::{
    error::AppResult,
    models::activity::{ActivityEntry, ActivityQuery},
    repository::Repository,
};

#[derive(Clone)]
pub struct ActivityService {
    repository: Repository,
}

impl ActivityService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &ActivityQuery) -> AppResult<(Vec<ActivityEntry>, i64)> {
        self.repository.activity.list(query).await
    }
}
