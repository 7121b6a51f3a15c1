use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder,
};

use crate::{
    entity,
    error::{ProductError, ProductResult},
    models::{Product, ProductDraft, ProductSort},
    repository::ProductRepository,
};

pub struct PgProductRepository {
    db: DatabaseConnection,
}

impl PgProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Build a `LIKE` pattern matching `term` anywhere, with wildcards in `term` escaped
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn create(&self, draft: ProductDraft) -> ProductResult<Product> {
        let active_model: entity::ActiveModel = draft.into();

        let model = active_model.insert(&self.db).await?;

        tracing::info!(product_id = model.id, "Created product");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: i64) -> ProductResult<Option<Product>> {
        let model = entity::Entity::find_by_id(id).one(&self.db).await?;

        Ok(model.map(|m| m.into()))
    }

    async fn list(&self, sort: ProductSort) -> ProductResult<Vec<Product>> {
        let query = match sort {
            ProductSort::Id => entity::Entity::find().order_by_asc(entity::Column::Id),
            // Same ordering as the in-memory store, independent of collation
            ProductSort::Name => entity::Entity::find()
                .order_by_asc(Expr::cust("LOWER(\"name\")"))
                .order_by_asc(entity::Column::Id),
        };

        let models = query.all(&self.db).await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    async fn update(&self, id: i64, draft: ProductDraft) -> ProductResult<Product> {
        let model = entity::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(ProductError::NotFound(id))?;

        let previous: DateTime<Utc> = model.updated_at.into();
        let updated_at = Utc::now().max(previous);

        // id and created_at stay untouched
        let mut active_model = model.into_active_model();
        active_model.name = Set(draft.name);
        active_model.description = Set(draft.description);
        active_model.quantity = Set(draft.quantity);
        active_model.price = Set(draft.price);
        active_model.updated_at = Set(updated_at.into());

        // The row can be deleted between the read and the write
        let updated_model = match active_model.update(&self.db).await {
            Err(DbErr::RecordNotUpdated) => return Err(ProductError::NotFound(id)),
            result => result?,
        };

        tracing::info!(product_id = id, "Updated product");
        Ok(updated_model.into())
    }

    async fn delete(&self, id: i64) -> ProductResult<bool> {
        let result = entity::Entity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected > 0 {
            tracing::info!(product_id = id, "Deleted product");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn exists(&self, id: i64) -> ProductResult<bool> {
        let exists = entity::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .is_some();

        Ok(exists)
    }

    async fn search_by_name(&self, term: &str) -> ProductResult<Vec<Product>> {
        let models = entity::Entity::find()
            .filter(Expr::cust_with_values(
                "LOWER(\"name\") LIKE ?",
                [contains_pattern(term)],
            ))
            .order_by_asc(entity::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    async fn find_low_stock(&self, threshold: i32) -> ProductResult<Vec<Product>> {
        let models = entity::Entity::find()
            .filter(entity::Column::Quantity.lt(threshold))
            .order_by_asc(entity::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn model(id: i64, name: &str, quantity: i32) -> entity::Model {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        entity::Model {
            id,
            name: name.to_string(),
            description: None,
            quantity,
            price: Decimal::new(50, 2),
            created_at: ts.into(),
            updated_at: ts.into(),
        }
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("Wid"), "%wid%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern(""), "%%");
    }

    #[tokio::test]
    async fn test_get_by_id_maps_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model(1, "Bolt", 5)]])
            .into_connection();
        let repo = PgProductRepository::new(db);

        let product = repo.get_by_id(1).await.unwrap().unwrap();

        assert_eq!(product.id, 1);
        assert_eq!(product.name, "Bolt");
        assert_eq!(product.price, Decimal::new(50, 2));
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<entity::Model>::new()])
            .into_connection();
        let repo = PgProductRepository::new(db);

        let draft = ProductDraft {
            name: "Bolt".to_string(),
            description: None,
            quantity: 0,
            price: Decimal::ONE,
        };
        let result = repo.update(7, draft).await;

        assert!(matches!(result, Err(ProductError::NotFound(7))));
    }

    #[tokio::test]
    async fn test_update_of_concurrently_deleted_row_is_not_found() {
        // Found by the read, gone by the time the UPDATE .. RETURNING runs
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model(7, "Bolt", 3)], Vec::new()])
            .into_connection();
        let repo = PgProductRepository::new(db);

        let draft = ProductDraft {
            name: "Bolt".to_string(),
            description: None,
            quantity: 4,
            price: Decimal::ONE,
        };
        let result = repo.update(7, draft).await;

        assert!(matches!(result, Err(ProductError::NotFound(7))));
    }

    #[tokio::test]
    async fn test_update_keeps_created_at() {
        let before = model(7, "Bolt", 3);
        let mut after = before.clone();
        after.quantity = 4;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![before.clone()], vec![after]])
            .into_connection();
        let repo = PgProductRepository::new(db);

        let draft = ProductDraft {
            name: "Bolt".to_string(),
            description: None,
            quantity: 4,
            price: Decimal::ONE,
        };
        let updated = repo.update(7, draft).await.unwrap();

        assert_eq!(updated.quantity, 4);
        assert_eq!(updated.created_at, DateTime::<Utc>::from(before.created_at));
    }

    #[tokio::test]
    async fn test_delete_reports_affected_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
            ])
            .into_connection();
        let repo = PgProductRepository::new(db);

        assert!(repo.delete(1).await.unwrap());
        assert!(!repo.delete(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_low_stock_maps_all_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model(1, "Nine", 9), model(3, "Zero", 0)]])
            .into_connection();
        let repo = PgProductRepository::new(db);

        let low = repo.find_low_stock(10).await.unwrap();

        assert_eq!(low.len(), 2);
        assert!(low.iter().all(|p| p.quantity < 10));
    }
}
