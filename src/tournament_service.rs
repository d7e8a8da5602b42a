//! # Tournament Service
//!
//! Create, list and fetch tournaments. A create writes the tournament first and
//! then links it into the owner's tournament index; the two writes are not
//! atomic, so a failure between them leaves an orphan that
//! [`crate::reconcile`] can repair.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::auth::IdentityContext;
use crate::config::AppConfig;
use crate::domain::{NewTournament, Tournament, TournamentId, UserId};
use crate::error::StoreError;
use crate::pagination::{DEFAULT_PAGE, PageError, PageRequest};
use crate::store::RecordStore;
use crate::validation::{CreateTournamentRequest, ValidationError, validate};

/// Source of creation timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

const DEFAULT_LIST_LIMIT: u64 = 9;
const MAX_LIST_LIMIT: u64 = 100;

#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("a session is required")]
    Unauthenticated,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    InvalidPage(#[from] PageError),
    #[error("tournament {0} not found")]
    NotFound(TournamentId),
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The tournament was inserted but the owner's index was not updated.
    #[error("tournament {tournament_id} was created but not linked to its owner: {source}")]
    OrphanedTournament {
        tournament_id: TournamentId,
        #[source]
        source: StoreError,
    },
}

/// One page of the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct TournamentPage {
    pub tournaments: Vec<Tournament>,
    pub total_pages: u64,
}

#[derive(Clone)]
pub struct TournamentService {
    store: Arc<dyn RecordStore>,
    store_timeout: Duration,
    clock: Clock,
    default_limit: u64,
    max_limit: u64,
}

impl TournamentService {
    pub fn new(store: Arc<dyn RecordStore>, store_timeout: Duration) -> Self {
        Self {
            store,
            store_timeout,
            clock: Arc::new(Utc::now),
            default_limit: DEFAULT_LIST_LIMIT,
            max_limit: MAX_LIST_LIMIT,
        }
    }

    pub fn from_config(store: Arc<dyn RecordStore>, config: &AppConfig) -> Self {
        Self::new(store, Duration::from_millis(config.store_timeout_ms))
            .with_list_limits(config.list_default_limit, config.list_max_limit)
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_list_limits(mut self, default_limit: u64, max_limit: u64) -> Self {
        self.default_limit = default_limit;
        self.max_limit = max_limit;
        self
    }

    /// Builds a page request from optional query values, filling in defaults.
    pub fn page_request(
        &self,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<PageRequest, TournamentError> {
        let default_limit = i64::try_from(self.default_limit).unwrap_or(i64::MAX);
        Ok(PageRequest::new(
            page.unwrap_or(DEFAULT_PAGE),
            limit.unwrap_or(default_limit),
            self.max_limit,
        )?)
    }

    /// Validate and persist a tournament owned by the caller, then prepend it
    /// to the caller's tournament index.
    #[instrument(skip_all)]
    pub async fn create(
        &self,
        identity: &IdentityContext,
        request: CreateTournamentRequest,
    ) -> Result<TournamentId, TournamentError> {
        let user = identity.user_id().ok_or(TournamentError::Unauthenticated)?;
        let validated = validate(&request)?;

        if let Some(declared) = request.created_by.as_deref()
            && declared != user.as_str()
        {
            warn!(
                user_id = %user,
                declared_owner = declared,
                "Ignoring createdBy that does not match the session user"
            );
        }

        let new_tournament = NewTournament {
            name: validated.name,
            teams: validated.teams,
            created_by: user.clone(),
            created_at: (self.clock)(),
        };

        let tournament_id = self
            .bounded("insert_tournament", self.store.insert_tournament(new_tournament))
            .await?;

        if let Err(source) = self.link_to_owner(user, tournament_id).await {
            error!(
                tournament_id = %tournament_id,
                user_id = %user,
                error = %source,
                "Tournament created but owner index update failed; run reconcile_tournament_index"
            );
            return Err(TournamentError::OrphanedTournament {
                tournament_id,
                source,
            });
        }

        info!(tournament_id = %tournament_id, user_id = %user, "Tournament created");
        Ok(tournament_id)
    }

    async fn link_to_owner(&self, user: &UserId, id: TournamentId) -> Result<(), StoreError> {
        let mut index = self
            .bounded("get_tournament_index", self.store.get_tournament_index(user))
            .await?
            .unwrap_or_default();
        index.insert(0, id);

        self.bounded(
            "set_tournament_index",
            self.store.set_tournament_index(user, &index),
        )
        .await
    }

    /// One page of the catalog, newest first.
    #[instrument(skip_all, fields(page = page.page(), limit = page.limit()))]
    pub async fn list(&self, page: PageRequest) -> Result<TournamentPage, TournamentError> {
        let total = self
            .bounded("count_tournaments", self.store.count_tournaments())
            .await?;
        let total_pages = page.total_pages(total);

        let tournaments = if page.offset() >= total {
            Vec::new()
        } else {
            self.bounded(
                "list_tournaments",
                self.store.list_tournaments(page.offset(), page.limit()),
            )
            .await?
        };

        debug!(total, total_pages, returned = tournaments.len(), "Listed tournaments");
        Ok(TournamentPage {
            tournaments,
            total_pages,
        })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: TournamentId) -> Result<Tournament, TournamentError> {
        self.bounded("get_tournament", self.store.get_tournament(id))
            .await?
            .ok_or(TournamentError::NotFound(id))
    }

    /// The caller's tournaments in index order. Entries that no longer resolve
    /// are skipped.
    #[instrument(skip_all)]
    pub async fn list_for_user(
        &self,
        identity: &IdentityContext,
    ) -> Result<Vec<Tournament>, TournamentError> {
        let user = identity.user_id().ok_or(TournamentError::Unauthenticated)?;
        let index = self
            .bounded("get_tournament_index", self.store.get_tournament_index(user))
            .await?
            .unwrap_or_default();

        let mut tournaments = Vec::with_capacity(index.len());
        for id in index {
            match self
                .bounded("get_tournament", self.store.get_tournament(id))
                .await?
            {
                Some(tournament) => tournaments.push(tournament),
                None => warn!(user_id = %user, tournament_id = %id, "Index entry does not resolve"),
            }
        }

        Ok(tournaments)
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                let timeout_ms = u64::try_from(self.store_timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(operation, timeout_ms, "Store call timed out");
                Err(StoreError::Timeout {
                    operation,
                    timeout_ms,
                })
            }
        }
    }
}
