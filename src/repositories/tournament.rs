//! # Tournament Repository
//!
//! SeaORM operations on the tournaments table: insert with a generated id,
//! lookup, counting, and newest-first range queries.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::domain::{NewTournament, Team, Tournament, TournamentId, UserId};
use crate::error::StoreError;
use crate::models::tournament::{self, Entity as TournamentEntity};

/// Repository for tournament database operations
#[derive(Debug, Clone)]
pub struct TournamentRepository {
    db: Arc<DatabaseConnection>,
}

impl TournamentRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a tournament; the id is generated here, not by the caller.
    pub async fn insert(&self, new: NewTournament) -> Result<Tournament, StoreError> {
        let id = Uuid::new_v4();
        let teams = serde_json::to_value(&new.teams).map_err(|e| StoreError::corrupt(id, e))?;

        let model = tournament::ActiveModel {
            id: Set(id),
            name: Set(new.name),
            teams: Set(teams),
            created_by: Set(new.created_by.to_string()),
            created_at: Set(new.created_at.into()),
        }
        .insert(&*self.db)
        .await?;

        into_domain(model)
    }

    pub async fn find_by_id(&self, id: TournamentId) -> Result<Option<Tournament>, StoreError> {
        TournamentEntity::find_by_id(id.0)
            .one(&*self.db)
            .await?
            .map(into_domain)
            .transpose()
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        Ok(TournamentEntity::find().count(&*self.db).await?)
    }

    /// Newest first; `id` breaks ties so repeated reads return the same order.
    pub async fn list_page(&self, offset: u64, limit: u64) -> Result<Vec<Tournament>, StoreError> {
        TournamentEntity::find()
            .order_by_desc(tournament::Column::CreatedAt)
            .order_by_desc(tournament::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(into_domain)
            .collect()
    }

    pub async fn list_by_creator(&self, user: &UserId) -> Result<Vec<Tournament>, StoreError> {
        TournamentEntity::find()
            .filter(tournament::Column::CreatedBy.eq(user.as_str()))
            .order_by_desc(tournament::Column::CreatedAt)
            .order_by_desc(tournament::Column::Id)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(into_domain)
            .collect()
    }

    /// Distinct owners of at least one tournament, sorted.
    pub async fn list_creators(&self) -> Result<Vec<UserId>, StoreError> {
        let creators: Vec<String> = TournamentEntity::find()
            .select_only()
            .column(tournament::Column::CreatedBy)
            .distinct()
            .order_by_asc(tournament::Column::CreatedBy)
            .into_tuple()
            .all(&*self.db)
            .await?;

        Ok(creators.into_iter().map(UserId::new).collect())
    }
}

fn into_domain(model: tournament::Model) -> Result<Tournament, StoreError> {
    let teams: Vec<Team> =
        serde_json::from_value(model.teams).map_err(|e| StoreError::corrupt(model.id, e))?;

    Ok(Tournament {
        id: TournamentId(model.id),
        name: model.name,
        teams,
        created_by: UserId::new(model.created_by),
        created_at: model.created_at.to_utc(),
    })
}
