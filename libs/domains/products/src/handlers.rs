//! HTTP handlers for Products API

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{
    AppError, AuditEvent, AuditOutcome, IdPath, ValidatedJson,
    errors::responses::{
        BadRequestIdResponse, BadRequestValidationResponse, InternalServerErrorResponse,
        NotFoundResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::entity;
use crate::models::{
    ListParams, LowStockParams, Product, ProductRequest, ProductSort, SearchParams,
};
use crate::repository::ProductRepository;
use crate::service::ProductService;

/// OpenAPI documentation for Products API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        create_product,
        get_product,
        update_product,
        delete_product,
        search_products,
        low_stock_products,
    ),
    components(
        schemas(Product, ProductRequest, ProductSort),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestIdResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = entity::Model::TAG, description = "Inventory product endpoints")
    )
)]
pub struct ApiDoc;

/// Create the products router with all HTTP endpoints
pub fn router<R: ProductRepository + 'static>(service: ProductService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/search", get(search_products))
        .route("/low-stock", get(low_stock_products))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .with_state(shared_service)
}

/// Query string errors use the same JSON envelope as every other 400
fn query<T>(extracted: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    extracted
        .map(|Query(params)| params)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

fn audit(action: &str, id: i64, headers: &HeaderMap) {
    AuditEvent::new(action, Some(format!("product:{id}")), AuditOutcome::Success)
        .with_request_headers(headers)
        .log();
}

/// List all products
#[utoipa::path(
    get,
    path = "",
    tag = entity::Model::TAG,
    params(ListParams),
    responses(
        (status = 200, description = "List of products", body = Vec<Product>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Product>>, AppError> {
    let params = query(params)?;
    let products = service.find_all_sorted(params.sort).await?;
    Ok(Json(products))
}

/// Create a new product
#[utoipa::path(
    post,
    path = "",
    tag = entity::Model::TAG,
    request_body = ProductRequest,
    responses(
        (status = 201, description = "Product created successfully", body = Product),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<ProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    let product = service.create(input).await?;
    audit("product.create", product.id, &headers);
    Ok((StatusCode::CREATED, Json(product)))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = entity::Model::TAG,
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product found", body = Product),
        (status = 400, response = BadRequestIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    IdPath(id): IdPath,
) -> Result<Json<Product>, AppError> {
    let product = service.find_by_id(id).await?;
    Ok(Json(product))
}

/// Replace every mutable field of a product
#[utoipa::path(
    put,
    path = "/{id}",
    tag = entity::Model::TAG,
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    request_body = ProductRequest,
    responses(
        (status = 200, description = "Product updated successfully", body = Product),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    IdPath(id): IdPath,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<ProductRequest>,
) -> Result<Json<Product>, AppError> {
    let product = service.update(id, input).await?;
    audit("product.update", id, &headers);
    Ok(Json(product))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = entity::Model::TAG,
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 204, description = "Product deleted successfully"),
        (status = 400, response = BadRequestIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    IdPath(id): IdPath,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    service.delete(id).await?;
    audit("product.delete", id, &headers);
    Ok(StatusCode::NO_CONTENT)
}

/// Search products by name (case-insensitive substring)
#[utoipa::path(
    get,
    path = "/search",
    tag = entity::Model::TAG,
    params(SearchParams),
    responses(
        (status = 200, description = "Matching products, possibly empty", body = Vec<Product>),
        (status = 400, description = "Missing name parameter"),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn search_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<Product>>, AppError> {
    let params = query(params)?;
    let products = service.search_by_name(&params.name).await?;
    Ok(Json(products))
}

/// Products with quantity below a threshold
#[utoipa::path(
    get,
    path = "/low-stock",
    tag = entity::Model::TAG,
    params(LowStockParams),
    responses(
        (status = 200, description = "Low stock products", body = Vec<Product>),
        (status = 400, description = "Threshold is not an integer"),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn low_stock_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    params: Result<Query<LowStockParams>, QueryRejection>,
) -> Result<Json<Vec<Product>>, AppError> {
    let params = query(params)?;
    let products = service.find_low_stock(params.threshold).await?;
    Ok(Json(products))
}
