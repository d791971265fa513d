//! Category directory service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::category::{Category, CategoryInput},
    repository::Repository,
};

#[derive(Clone)]
pub struct CategoriesService {
    repository: Repository,
}

impl CategoriesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        self.repository.categories.list().await
    }

    pub async fn get_category(&self, id: i32) -> AppResult<Category> {
        self.repository
            .categories
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category with id {} not found", id)))
    }

    pub async fn create_category(&self, input: CategoryInput) -> AppResult<Category> {
        input.validate()?;
        self.repository.categories.create(&input).await
    }

    pub async fn update_category(&self, id: i32, input: CategoryInput) -> AppResult<Category> {
        input.validate()?;
        self.repository
            .categories
            .update(id, &input)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category with id {} not found", id)))
    }

    /// Delete a category and detach it from its books. Returns false if it did not exist.
    pub async fn delete_category(&self, id: i32) -> AppResult<bool> {
        let deleted = self.repository.categories.delete(id).await?;
        if deleted {
            tracing::info!("Deleted category id={}", id);
        } else {
            tracing::debug!("Category id={} not deleted: no such category", id);
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory::MemoryStore;

    fn service() -> CategoriesService {
        CategoriesService::new(Repository::in_memory(MemoryStore::new()))
    }

    fn input(name: &str) -> CategoryInput {
        CategoryInput {
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_delete_missing_category_leaves_others() {
        let service = service();
        let kept = service.create_category(input("Poetry")).await.unwrap();

        assert!(!service.delete_category(999).await.unwrap());
        assert_eq!(service.list_categories().await.unwrap(), vec![kept]);
    }

    #[tokio::test]
    async fn test_update_and_get() {
        let service = service();
        let created = service.create_category(input("Poetry")).await.unwrap();
        let updated = service.update_category(created.id, input("Verse")).await.unwrap();

        assert_eq!(updated.name, "Verse");
        assert_eq!(service.get_category(created.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let err = service().create_category(input("")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_missing_category() {
        let service = service();
        assert!(matches!(
            service.get_category(1).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.update_category(1, input("x")).await,
            Err(AppError::NotFound(_))
        ));
    }
}
