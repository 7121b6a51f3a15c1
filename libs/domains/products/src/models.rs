use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError, ValidationErrors};

/// Threshold used by the low-stock query when the caller does not supply one
pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 10;

/// Number of fractional digits stored for prices
pub const PRICE_SCALE: u32 = 2;

/// Largest price representable by a NUMERIC(10, 2) column (99999999.99)
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, PRICE_SCALE);

/// Names must contain something other than whitespace
fn validate_not_blank(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::new("blank")
            .with_message(Cow::Borrowed("Product name is required")));
    }
    Ok(())
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price < Decimal::ZERO {
        return Err(ValidationError::new("range")
            .with_message(Cow::Borrowed("Price must be zero or positive")));
    }
    if round_price(*price) > MAX_PRICE {
        return Err(ValidationError::new("range")
            .with_message(Cow::Borrowed("Price must not exceed 99999999.99")));
    }
    Ok(())
}

/// Round a price to the stored scale, half away from zero like NUMERIC does
pub fn round_price(price: Decimal) -> Decimal {
    price.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Ordering applied when listing every product
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProductSort {
    /// Store order (ascending id)
    #[default]
    Id,
    /// Ascending by lowercased name, ties by id
    Name,
}

/// Product transfer representation returned at the API boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Store-assigned identifier
    pub id: i64,
    /// Product name
    pub name: String,
    /// Optional free-text description (at most 500 characters)
    pub description: Option<String>,
    /// Units in stock
    pub quantity: i32,
    /// Unit price with two fractional digits
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 0.5)]
    pub price: Decimal,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Payload accepted by both create and update
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ProductRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 255, message = "Product name is required"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    #[validate(
        required(message = "Quantity is required"),
        range(min = 0, message = "Quantity must be zero or positive")
    )]
    pub quantity: Option<i32>,
    #[validate(
        required(message = "Price is required"),
        custom(function = "validate_price")
    )]
    #[schema(value_type = f64, example = 0.5)]
    pub price: Option<Decimal>,
}

impl ProductRequest {
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        quantity: i32,
        price: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            description,
            quantity: Some(quantity),
            price: Some(price),
        }
    }
}

/// Validated product fields, ready to be written to a store
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub price: Decimal,
}

fn missing(field: &'static str, message: &'static str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        field,
        ValidationError::new("required").with_message(Cow::Borrowed(message)),
    );
    errors
}

impl TryFrom<ProductRequest> for ProductDraft {
    type Error = ValidationErrors;

    fn try_from(request: ProductRequest) -> Result<Self, Self::Error> {
        request.validate()?;

        let quantity = request
            .quantity
            .ok_or_else(|| missing("quantity", "Quantity is required"))?;
        let price = request
            .price
            .ok_or_else(|| missing("price", "Price is required"))?;

        Ok(Self {
            name: request.name,
            description: request.description,
            quantity,
            price: round_price(price),
        })
    }
}

/// Query parameters for listing products
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    #[serde(default)]
    pub sort: ProductSort,
}

/// Query parameters for the name search
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Case-insensitive substring matched against product names
    pub name: String,
}

/// Query parameters for the low-stock filter
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LowStockParams {
    /// Products with quantity strictly below this value are returned (default 10)
    pub threshold: Option<i32>,
}

impl Product {
    /// Build a freshly created product; both timestamps share the same instant
    pub fn new(id: i64, draft: ProductDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            quantity: draft.quantity,
            price: draft.price,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace every mutable field and refresh `updated_at`
    pub fn apply_update(&mut self, draft: ProductDraft, now: DateTime<Utc>) {
        self.name = draft.name;
        self.description = draft.description;
        self.quantity = draft.quantity;
        self.price = draft.price;
        self.updated_at = now.max(self.updated_at);
    }
}
