//! Business logic services

pub mod activity;
pub mod borrows;
pub mod equipment;
pub mod repairs;
pub mod stats;
pub mod users;

use crate::{
    config::{AuthConfig, BorrowsConfig},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub equipment: equipment::EquipmentService,
    pub borrows: borrows::BorrowsService,
    pub repairs: repairs::RepairsService,
    pub activity: activity::ActivityService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        borrows_config: BorrowsConfig,
    ) -> Self {
        Self {
            users: users::UsersService::new(repository.clone(), auth_config),
            equipment: equipment::EquipmentService::new(repository.clone()),
            borrows: borrows::BorrowsService::new(repository.clone(), borrows_config),
            repairs: repairs::RepairsService::new(repository.clone()),
            activity: activity::ActivityService::new(repository.clone()),
            stats: stats::StatsService::new(repository),
        }
    }
}
