//! # User Index Repository
//!
//! Reads and writes the per-user tournament index. The user record itself
//! belongs to the identity provider, so a write upserts the row.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{DatabaseConnection, EntityTrait, Set, sea_query::OnConflict};

use crate::domain::{TournamentId, UserId};
use crate::error::StoreError;
use crate::models::user::{self, Entity as UserEntity};

/// Repository for the `users.tournaments_id` index
#[derive(Debug, Clone)]
pub struct UserIndexRepository {
    db: Arc<DatabaseConnection>,
}

impl UserIndexRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// `None` when the user row does not exist; an empty list when the field is null.
    pub async fn get_index(&self, user: &UserId) -> Result<Option<Vec<TournamentId>>, StoreError> {
        let Some(row) = UserEntity::find_by_id(user.as_str().to_string())
            .one(&*self.db)
            .await?
        else {
            return Ok(None);
        };

        match row.tournaments_id {
            None | Some(serde_json::Value::Null) => Ok(Some(Vec::new())),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StoreError::corrupt(user, e)),
        }
    }

    /// Replace the whole index in a single upsert.
    pub async fn put_index(&self, user: &UserId, ids: &[TournamentId]) -> Result<(), StoreError> {
        let value = serde_json::to_value(ids).map_err(|e| StoreError::corrupt(user, e))?;
        let row = user::ActiveModel {
            id: Set(user.as_str().to_string()),
            tournaments_id: Set(Some(value)),
            updated_at: Set(Utc::now().into()),
        };

        UserEntity::insert(row)
            .on_conflict(
                OnConflict::column(user::Column::Id)
                    .update_columns([user::Column::TournamentsId, user::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await?;

        Ok(())
    }
}
