//! Business logic services

pub mod borrowing;
pub mod catalog;
pub mod categories;
pub mod users;

use crate::{config::BorrowingConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub catalog: catalog::CatalogService,
    pub categories: categories::CategoriesService,
    pub borrowing: borrowing::BorrowingService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, borrowing_config: BorrowingConfig) -> Self {
        Self {
            users: users::UsersService::new(repository.clone()),
            catalog: catalog::CatalogService::new(repository.clone()),
            categories: categories::CategoriesService::new(repository.clone()),
            borrowing: borrowing::BorrowingService::new(
                repository,
                borrowing_config.transition_policy,
            ),
        }
    }
}
