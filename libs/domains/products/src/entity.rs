use crate::models::{Product, ProductDraft};
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::{NotSet, Set};
use serde::{Deserialize, Serialize};

/// Sea-ORM Entity for Products table
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    #[sea_orm(nullable)]
    pub description: Option<String>,
    pub quantity: i32,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// OpenAPI tag for product endpoints
    pub const TAG: &'static str = "products";
    /// Mount point of the product routes below `/api`
    pub const URL: &'static str = "/products";
}

// Conversion from Sea-ORM Model to the transfer representation
impl From<Model> for Product {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            quantity: model.quantity,
            price: model.price,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

// Conversion from a validated draft to a new row; the store assigns the id
impl From<ProductDraft> for ActiveModel {
    fn from(draft: ProductDraft) -> Self {
        let now = chrono::Utc::now();

        ActiveModel {
            id: NotSet,
            name: Set(draft.name),
            description: Set(draft.description),
            quantity: Set(draft.quantity),
            price: Set(draft.price),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
    }
}
