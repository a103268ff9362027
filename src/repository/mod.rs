//! Repository layer for database operations
//!
//! Every multi-document workflow mutation runs inside a single sqlx
//! transaction together with its activity log entry, so a failure at any
//! point leaves all documents at their prior state.

pub mod activity;
pub mod borrows;
pub mod equipment;
pub mod repairs;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub equipment: equipment::EquipmentRepository,
    pub users: users::UsersRepository,
    pub borrows: borrows::BorrowsRepository,
    pub repairs: repairs::RepairsRepository,
    pub activity: activity::ActivityRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            equipment: equipment::EquipmentRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            borrows: borrows::BorrowsRepository::new(pool.clone()),
            repairs: repairs::RepairsRepository::new(pool.clone()),
            activity: activity::ActivityRepository::new(pool.clone()),
            pool,
        }
    }
}
