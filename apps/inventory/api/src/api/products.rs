use axum::Router;
use domain_products::{InMemoryProductRepository, PgProductRepository, ProductService, handlers};

pub fn router(state: &crate::state::AppState) -> Router {
    match &state.db {
        Some(db) => handlers::router(ProductService::new(PgProductRepository::new(db.clone()))),
        None => handlers::router(ProductService::new(InMemoryProductRepository::new())),
    }
}
