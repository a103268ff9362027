//! Repair management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        activity::Actor,
        repair::{CompleteRepairRequest, RepairQuery, RepairRequest},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct RepairsService {
    repository: Repository,
}

impl RepairsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<RepairRequest> {
        self.repository.repairs.get_by_id(id).await
    }

    pub async fn list(&self, query: &RepairQuery) -> AppResult<(Vec<RepairRequest>, i64)> {
        self.repository.repairs.list(query).await
    }

    pub async fn approve(&self, id: i32, actor: &Actor) -> AppResult<RepairRequest> {
        self.repository.repairs.approve(id, actor).await
    }

    pub async fn reject(&self, id: i32, reason: Option<&str>, actor: &Actor) -> AppResult<RepairRequest> {
        self.repository.repairs.reject(id, reason, actor).await
    }

    pub async fn complete(
        &self,
        id: i32,
        data: &CompleteRepairRequest,
        actor: &Actor,
    ) -> AppResult<RepairRequest> {
        data.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        self.repository.repairs.complete(id, data, actor).await
    }
}
