//! User entity model
//!
//! Only the slice of the user record this service owns: the tournament
//! index. A null `tournaments_id` reads as an empty index.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Identity-provider user id (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Tournament ids owned by the user, most recent first
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub tournaments_id: Option<JsonValue>,

    /// Last time the index was written
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
