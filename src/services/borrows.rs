//! Borrow lifecycle service

use validator::Validate;

use crate::{
    config::BorrowsConfig,
    error::{AppError, AppResult},
    models::{
        activity::Actor,
        assessment::{DeliveryAssessmentRequest, ReturnAssessmentRequest},
        borrow::{BorrowDetails, BorrowQuery, BorrowRequest, CreateBorrowRequest},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct BorrowsService {
    repository: Repository,
    config: BorrowsConfig,
}

impl BorrowsService {
    pub fn new(repository: Repository, config: BorrowsConfig) -> Self {
        Self { repository, config }
    }

    /// Submit a borrow request on behalf of the actor
    pub async fn submit(&self, data: &CreateBorrowRequest, actor: &Actor) -> AppResult<BorrowRequest> {
        data.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let requester = self.repository.users.get_by_id(actor.id).await?;
        self.repository
            .borrows
            .create(&requester, data, self.config.period_days, actor)
            .await
    }

    pub async fn get_details(&self, id: i32) -> AppResult<BorrowDetails> {
        self.repository.borrows.get_details(id).await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<BorrowRequest> {
        self.repository.borrows.get_by_id(id).await
    }

    pub async fn list(&self, query: &BorrowQuery) -> AppResult<(Vec<BorrowRequest>, i64)> {
        self.repository.borrows.list(query).await
    }

    /// Borrow history for one user
    pub async fn get_user_borrows(&self, user_id: i32) -> AppResult<Vec<BorrowRequest>> {
        // Verify user exists
        self.repository.users.get_by_id(user_id).await?;
        let query = BorrowQuery {
            status: None,
            user_id: Some(user_id),
            page: Some(1),
            per_page: Some(100),
        };
        let (rows, _) = self.repository.borrows.list(&query).await?;
        Ok(rows)
    }

    /// Approve a request and auto-assign available equipment to its lines
    pub async fn approve(&self, id: i32, actor: &Actor) -> AppResult<BorrowDetails> {
        self.repository.borrows.approve(id, actor).await
    }

    pub async fn reject(&self, id: i32, reason: Option<&str>, actor: &Actor) -> AppResult<BorrowRequest> {
        self.repository.borrows.reject(id, reason, actor).await
    }

    /// Pre-delivery assessment of one assigned unit
    pub async fn assess_delivery(
        &self,
        id: i32,
        data: &DeliveryAssessmentRequest,
        actor: &Actor,
    ) -> AppResult<BorrowDetails> {
        data.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        self.repository.borrows.assess_delivery(id, data, actor).await
    }

    /// Process the return of a borrowed request
    pub async fn process_return(&self, id: i32, actor: &Actor) -> AppResult<BorrowDetails> {
        self.repository.borrows.process_return(id, actor).await
    }

    /// Post-return assessment of one returned unit
    pub async fn assess_return(
        &self,
        id: i32,
        data: &ReturnAssessmentRequest,
        actor: &Actor,
    ) -> AppResult<BorrowDetails> {
        data.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        self.repository.borrows.assess_return(id, data, actor).await
    }
}
