//! Product Service - Business logic layer

use std::sync::Arc;
use tracing::instrument;

use crate::error::{ProductError, ProductResult};
use crate::models::{
    Product, ProductDraft, ProductRequest, ProductSort, DEFAULT_LOW_STOCK_THRESHOLD,
};
use crate::repository::ProductRepository;

/// Product service providing business logic operations
///
/// Input is validated here before any repository call, so a rejected
/// request never touches the store.
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> ProductService<R> {
    /// Create a new ProductService with the given repository
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// All products in store order
    #[instrument(skip(self))]
    pub async fn find_all(&self) -> ProductResult<Vec<Product>> {
        self.repository.list(ProductSort::Id).await
    }

    /// All products in the requested order
    #[instrument(skip(self))]
    pub async fn find_all_sorted(&self, sort: ProductSort) -> ProductResult<Vec<Product>> {
        self.repository.list(sort).await
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: i64) -> ProductResult<Product> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    #[instrument(skip(self, input), fields(product_name = %input.name))]
    pub async fn create(&self, input: ProductRequest) -> ProductResult<Product> {
        let draft = ProductDraft::try_from(input)?;

        self.repository.create(draft).await
    }

    /// Replace every mutable field of an existing product
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: i64, input: ProductRequest) -> ProductResult<Product> {
        let draft = ProductDraft::try_from(input)?;

        self.repository.update(id, draft).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> ProductResult<()> {
        if !self.repository.exists(id).await? {
            return Err(ProductError::NotFound(id));
        }

        // A concurrent delete may win between the two calls
        if !self.repository.delete(id).await? {
            return Err(ProductError::NotFound(id));
        }

        Ok(())
    }

    /// Case-insensitive substring search; an empty term matches everything
    #[instrument(skip(self))]
    pub async fn search_by_name(&self, name: &str) -> ProductResult<Vec<Product>> {
        self.repository.search_by_name(name).await
    }

    /// Products with quantity strictly below `threshold` (default 10)
    #[instrument(skip(self))]
    pub async fn find_low_stock(&self, threshold: Option<i32>) -> ProductResult<Vec<Product>> {
        let threshold = threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
        tracing::debug!(threshold, "Querying low stock products");

        self.repository.find_low_stock(threshold).await
    }
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockProductRepository;
    use chrono::Utc;
    use mockall::predicate::eq;
    use rust_decimal::Decimal;

    fn product(id: i64, name: &str, quantity: i32) -> Product {
        Product::new(
            id,
            ProductDraft {
                name: name.to_string(),
                description: None,
                quantity,
                price: Decimal::new(50, 2),
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_find_by_id_missing_is_not_found() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_get_by_id()
            .with(eq(42))
            .returning(|_| Ok(None));

        let service = ProductService::new(mock_repo);
        let result = service.find_by_id(42).await;

        assert!(matches!(result, Err(ProductError::NotFound(42))));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input_without_touching_store() {
        let mut mock_repo = MockProductRepository::new();
        // No store call is allowed for a rejected request
        mock_repo.expect_create().never();

        let service = ProductService::new(mock_repo);
        let input = ProductRequest::new("Bolt", None, -1, Decimal::ONE);
        let result = service.create(input).await;

        assert!(matches!(result, Err(ProductError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_passes_rounded_draft_to_store() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_create()
            .withf(|draft| draft.price == Decimal::new(1235, 2) && draft.name == "Bolt")
            .times(1)
            .returning(|draft| Ok(Product::new(1, draft, Utc::now())));

        let service = ProductService::new(mock_repo);
        let input = ProductRequest::new("Bolt", None, 5, Decimal::new(12345, 3));
        let created = service.create(input).await.unwrap();

        assert_eq!(created.id, 1);
        assert_eq!(created.price, Decimal::new(1235, 2));
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_input_before_existence_check() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_update().never();

        let service = ProductService::new(mock_repo);
        let input = ProductRequest::new("  ", None, 1, Decimal::ONE);
        let result = service.update(99, input).await;

        assert!(matches!(result, Err(ProductError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_exists()
            .with(eq(7))
            .returning(|_| Ok(false));
        mock_repo.expect_delete().never();

        let service = ProductService::new(mock_repo);
        let result = service.delete(7).await;

        assert!(matches!(result, Err(ProductError::NotFound(7))));
    }

    #[tokio::test]
    async fn test_delete_existing_product() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_exists().with(eq(3)).returning(|_| Ok(true));
        mock_repo
            .expect_delete()
            .with(eq(3))
            .times(1)
            .returning(|_| Ok(true));

        let service = ProductService::new(mock_repo);

        assert!(service.delete(3).await.is_ok());
    }

    #[tokio::test]
    async fn test_low_stock_uses_default_threshold() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_find_low_stock()
            .with(eq(DEFAULT_LOW_STOCK_THRESHOLD))
            .returning(|_| Ok(vec![product(1, "Nine", 9)]));

        let service = ProductService::new(mock_repo);
        let low = service.find_low_stock(None).await.unwrap();

        assert_eq!(low.len(), 1);
        assert_eq!(low[0].quantity, 9);
    }

    #[tokio::test]
    async fn test_low_stock_honors_explicit_threshold() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_find_low_stock()
            .with(eq(3))
            .returning(|_| Ok(vec![]));

        let service = ProductService::new(mock_repo);

        assert!(service.find_low_stock(Some(3)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_internal() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_list()
            .returning(|_| Err(ProductError::Internal("connection reset".to_string())));

        let service = ProductService::new(mock_repo);

        assert!(matches!(
            service.find_all().await,
            Err(ProductError::Internal(_))
        ));
    }
}
