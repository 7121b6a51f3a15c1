use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "Inventory API",
        version = "0.1.0",
        description = "Create, read, update, delete and query inventory products"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    nest(
        (path = domain_products::entity::Model::URL, api = domain_products::ApiDoc)
    )
)]
pub struct ApiDoc;
