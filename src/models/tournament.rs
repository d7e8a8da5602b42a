//! Tournament entity model
//!
//! SeaORM entity for the tournaments table. Teams are embedded as a JSON
//! array of `{ "name", "color" }` objects.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tournaments")]
pub struct Model {
    /// Store-assigned identifier (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Display name of the tournament
    pub name: String,

    /// Ordered team list, serialized as JSON
    #[sea_orm(column_type = "JsonBinary")]
    pub teams: JsonValue,

    /// Identifier of the owning user
    pub created_by: String,

    /// Creation timestamp, the listing sort key
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
