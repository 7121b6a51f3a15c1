use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{ProductError, ProductResult};
use crate::models::{Product, ProductDraft, ProductSort};

/// Repository trait for Product persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a new product; the store assigns id and timestamps
    async fn create(&self, draft: ProductDraft) -> ProductResult<Product>;

    /// Get a product by ID
    async fn get_by_id(&self, id: i64) -> ProductResult<Option<Product>>;

    /// List every product in the requested order
    async fn list(&self, sort: ProductSort) -> ProductResult<Vec<Product>>;

    /// Replace all mutable fields of an existing product
    async fn update(&self, id: i64, draft: ProductDraft) -> ProductResult<Product>;

    /// Delete a product by ID, returning whether a row was removed
    async fn delete(&self, id: i64) -> ProductResult<bool>;

    /// Check whether a product with this ID exists
    async fn exists(&self, id: i64) -> ProductResult<bool>;

    /// Case-insensitive substring match on name
    async fn search_by_name(&self, term: &str) -> ProductResult<Vec<Product>>;

    /// Products whose quantity is strictly below the threshold
    async fn find_low_stock(&self, threshold: i32) -> ProductResult<Vec<Product>>;
}

#[derive(Debug, Default)]
struct Store {
    next_id: i64,
    products: BTreeMap<i64, Product>,
}

/// In-memory implementation of ProductRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryProductRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn collect_where<F>(&self, predicate: F) -> Vec<Product>
    where
        F: Fn(&Product) -> bool,
    {
        let store = self.store.read().await;
        store
            .products
            .values()
            .filter(|p| predicate(p))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(&self, draft: ProductDraft) -> ProductResult<Product> {
        let mut store = self.store.write().await;

        store.next_id += 1;
        let product = Product::new(store.next_id, draft, Utc::now());
        store.products.insert(product.id, product.clone());

        tracing::info!(product_id = product.id, "Created product");
        Ok(product)
    }

    async fn get_by_id(&self, id: i64) -> ProductResult<Option<Product>> {
        let store = self.store.read().await;
        Ok(store.products.get(&id).cloned())
    }

    async fn list(&self, sort: ProductSort) -> ProductResult<Vec<Product>> {
        let mut result = self.collect_where(|_| true).await;

        if sort == ProductSort::Name {
            result.sort_by_cached_key(|p| (p.name.to_lowercase(), p.id));
        }

        Ok(result)
    }

    async fn update(&self, id: i64, draft: ProductDraft) -> ProductResult<Product> {
        let mut store = self.store.write().await;

        let product = store
            .products
            .get_mut(&id)
            .ok_or(ProductError::NotFound(id))?;
        product.apply_update(draft, Utc::now());
        let updated = product.clone();

        tracing::info!(product_id = id, "Updated product");
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> ProductResult<bool> {
        let mut store = self.store.write().await;

        if store.products.remove(&id).is_some() {
            tracing::info!(product_id = id, "Deleted product");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn exists(&self, id: i64) -> ProductResult<bool> {
        let store = self.store.read().await;
        Ok(store.products.contains_key(&id))
    }

    async fn search_by_name(&self, term: &str) -> ProductResult<Vec<Product>> {
        let needle = term.to_lowercase();
        Ok(self
            .collect_where(|p| p.name.to_lowercase().contains(&needle))
            .await)
    }

    async fn find_low_stock(&self, threshold: i32) -> ProductResult<Vec<Product>> {
        Ok(self.collect_where(|p| p.quantity < threshold).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn draft(name: &str, quantity: i32) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            description: None,
            quantity,
            price: Decimal::new(150, 2),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_product() {
        let repo = InMemoryProductRepository::new();

        let product = repo.create(draft("Widget", 4)).await.unwrap();
        assert_eq!(product.id, 1);
        assert_eq!(product.created_at, product.updated_at);

        let fetched = repo.get_by_id(product.id).await.unwrap();
        assert_eq!(fetched, Some(product));
    }

    #[tokio::test]
    async fn test_ids_are_never_reused() {
        let repo = InMemoryProductRepository::new();

        let first = repo.create(draft("A", 1)).await.unwrap();
        assert!(repo.delete(first.id).await.unwrap());
        let second = repo.create(draft("B", 1)).await.unwrap();

        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let repo = InMemoryProductRepository::new();

        let result = repo.update(99, draft("Ghost", 0)).await;
        assert!(matches!(result, Err(ProductError::NotFound(99))));
    }

    #[tokio::test]
    async fn test_list_sorted_by_name() {
        let repo = InMemoryProductRepository::new();
        repo.create(draft("Zeta", 1)).await.unwrap();
        repo.create(draft("Alpha", 1)).await.unwrap();

        let by_id = repo.list(ProductSort::Id).await.unwrap();
        assert_eq!(by_id[0].name, "Zeta");

        let by_name = repo.list(ProductSort::Name).await.unwrap();
        assert_eq!(by_name[0].name, "Alpha");
    }

    #[tokio::test]
    async fn test_list_by_name_ignores_case() {
        let repo = InMemoryProductRepository::new();
        let upper_bolt = repo.create(draft("Bolt", 1)).await.unwrap();
        repo.create(draft("apple", 1)).await.unwrap();
        repo.create(draft("Banana", 1)).await.unwrap();
        let lower_bolt = repo.create(draft("bolt", 1)).await.unwrap();

        let by_name = repo.list(ProductSort::Name).await.unwrap();
        let names: Vec<_> = by_name.iter().map(|p| p.name.as_str()).collect();

        assert_eq!(names, vec!["apple", "Banana", "Bolt", "bolt"]);
        assert_eq!(by_name[2].id, upper_bolt.id);
        assert_eq!(by_name[3].id, lower_bolt.id);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let repo = InMemoryProductRepository::new();
        repo.create(draft("Widget", 1)).await.unwrap();
        repo.create(draft("widget-2", 1)).await.unwrap();
        repo.create(draft("Gadget", 1)).await.unwrap();

        let found = repo.search_by_name("Wid").await.unwrap();
        let names: Vec<_> = found.iter().map(|p| p.name.as_str()).collect();

        assert_eq!(names, vec!["Widget", "widget-2"]);
    }

    #[tokio::test]
    async fn test_low_stock_is_strictly_below_threshold() {
        let repo = InMemoryProductRepository::new();
        repo.create(draft("Nine", 9)).await.unwrap();
        repo.create(draft("Ten", 10)).await.unwrap();
        repo.create(draft("Zero", 0)).await.unwrap();

        let low = repo.find_low_stock(10).await.unwrap();
        let names: Vec<_> = low.iter().map(|p| p.name.as_str()).collect();

        assert_eq!(names, vec!["Nine", "Zero"]);
    }
}
