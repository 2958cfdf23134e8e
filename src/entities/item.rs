use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub symbol: Option<String>,
    pub image_data: Option<Vec<u8>>,
    pub symbol_color: Option<String>,
    pub sort_order: i32,
    pub modified_date: DateTimeUtc,
    // Weak references: no foreign keys, dangling ids are legal.
    pub location_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
