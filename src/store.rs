//! # Record Store
//!
//! The persistence seam used by the tournament service. Production wires the
//! SeaORM-backed [`SeaOrmStore`]; tests can substitute their own implementation.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;

use crate::domain::{NewTournament, Tournament, TournamentId, UserId};
use crate::error::StoreError;
use crate::repositories::{TournamentRepository, UserIndexRepository};

/// Capabilities the tournament core needs from the underlying store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a tournament and return the id the store assigned.
    async fn insert_tournament(&self, tournament: NewTournament) -> Result<TournamentId, StoreError>;

    async fn get_tournament(&self, id: TournamentId) -> Result<Option<Tournament>, StoreError>;

    async fn count_tournaments(&self) -> Result<u64, StoreError>;

    /// Tournaments ordered by `created_at` descending, skipping `offset`, at most `limit`.
    async fn list_tournaments(&self, offset: u64, limit: u64) -> Result<Vec<Tournament>, StoreError>;

    /// All tournaments owned by `user`, newest first.
    async fn list_tournaments_by_creator(&self, user: &UserId) -> Result<Vec<Tournament>, StoreError>;

    /// Distinct tournament owners.
    async fn list_tournament_creators(&self) -> Result<Vec<UserId>, StoreError>;

    /// `None` if the user record is absent.
    async fn get_tournament_index(&self, user: &UserId) -> Result<Option<Vec<TournamentId>>, StoreError>;

    async fn set_tournament_index(&self, user: &UserId, ids: &[TournamentId]) -> Result<(), StoreError>;
}

/// [`RecordStore`] over a SeaORM connection pool.
#[derive(Debug, Clone)]
pub struct SeaOrmStore {
    tournaments: TournamentRepository,
    users: UserIndexRepository,
}

impl SeaOrmStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            tournaments: TournamentRepository::new(Arc::clone(&db)),
            users: UserIndexRepository::new(db),
        }
    }
}

#[async_trait]
impl RecordStore for SeaOrmStore {
    async fn insert_tournament(&self, tournament: NewTournament) -> Result<TournamentId, StoreError> {
        Ok(self.tournaments.insert(tournament).await?.id)
    }

    async fn get_tournament(&self, id: TournamentId) -> Result<Option<Tournament>, StoreError> {
        self.tournaments.find_by_id(id).await
    }

    async fn count_tournaments(&self) -> Result<u64, StoreError> {
        self.tournaments.count().await
    }

    async fn list_tournaments(&self, offset: u64, limit: u64) -> Result<Vec<Tournament>, StoreError> {
        self.tournaments.list_page(offset, limit).await
    }

    async fn list_tournaments_by_creator(&self, user: &UserId) -> Result<Vec<Tournament>, StoreError> {
        self.tournaments.list_by_creator(user).await
    }

    async fn list_tournament_creators(&self) -> Result<Vec<UserId>, StoreError> {
        self.tournaments.list_creators().await
    }

    async fn get_tournament_index(&self, user: &UserId) -> Result<Option<Vec<TournamentId>>, StoreError> {
        self.users.get_index(user).await
    }

    async fn set_tournament_index(&self, user: &UserId, ids: &[TournamentId]) -> Result<(), StoreError> {
        self.users.put_index(user, ids).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory [`RecordStore`] with switchable failures for service tests.

    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[derive(Default)]
    pub struct MemoryStore {
        tournaments: Mutex<Vec<Tournament>>,
        indexes: Mutex<HashMap<UserId, Option<Vec<TournamentId>>>>,
        pub fail_insert: AtomicBool,
        pub fail_index_read: AtomicBool,
        pub fail_index_write: AtomicBool,
        pub count_delay: Mutex<Option<Duration>>,
        pub writes: AtomicUsize,
    }

    impl MemoryStore {
        pub fn seed_tournament(&self, tournament: Tournament) {
            self.tournaments.lock().unwrap().push(tournament);
        }

        /// `None` models a user row whose index field is null.
        pub fn seed_index(&self, user: &UserId, ids: Option<Vec<TournamentId>>) {
            self.indexes.lock().unwrap().insert(user.clone(), ids);
        }

        pub fn index_of(&self, user: &UserId) -> Option<Vec<TournamentId>> {
            self.indexes.lock().unwrap().get(user).cloned().flatten()
        }

        pub fn tournament_count(&self) -> usize {
            self.tournaments.lock().unwrap().len()
        }

        fn injected(flag: &AtomicBool, what: &str) -> Result<(), StoreError> {
            if flag.load(Ordering::SeqCst) {
                Err(StoreError::Database(sea_orm::DbErr::Custom(format!(
                    "injected {what} failure"
                ))))
            } else {
                Ok(())
            }
        }

        fn sorted(mut tournaments: Vec<Tournament>) -> Vec<Tournament> {
            tournaments.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| b.id.0.cmp(&a.id.0))
            });
            tournaments
        }
    }

    #[async_trait]
    impl RecordStore for MemoryStore {
        async fn insert_tournament(&self, tournament: NewTournament) -> Result<TournamentId, StoreError> {
            Self::injected(&self.fail_insert, "insert")?;
            let id = TournamentId::new_v4();
            self.tournaments.lock().unwrap().push(Tournament {
                id,
                name: tournament.name,
                teams: tournament.teams,
                created_by: tournament.created_by,
                created_at: tournament.created_at,
            });
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(id)
        }

        async fn get_tournament(&self, id: TournamentId) -> Result<Option<Tournament>, StoreError> {
            Ok(self
                .tournaments
                .lock()
                .unwrap()
                .iter()
                .find(|t| t.id == id)
                .cloned())
        }

        async fn count_tournaments(&self) -> Result<u64, StoreError> {
            let delay = *self.count_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.tournaments.lock().unwrap().len() as u64)
        }

        async fn list_tournaments(&self, offset: u64, limit: u64) -> Result<Vec<Tournament>, StoreError> {
            let all = Self::sorted(self.tournaments.lock().unwrap().clone());
            Ok(all
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect())
        }

        async fn list_tournaments_by_creator(&self, user: &UserId) -> Result<Vec<Tournament>, StoreError> {
            let owned = self
                .tournaments
                .lock()
                .unwrap()
                .iter()
                .filter(|t| &t.created_by == user)
                .cloned()
                .collect();
            Ok(Self::sorted(owned))
        }

        async fn list_tournament_creators(&self) -> Result<Vec<UserId>, StoreError> {
            let mut creators: Vec<UserId> = self
                .tournaments
                .lock()
                .unwrap()
                .iter()
                .map(|t| t.created_by.clone())
                .collect();
            creators.sort();
            creators.dedup();
            Ok(creators)
        }

        async fn get_tournament_index(&self, user: &UserId) -> Result<Option<Vec<TournamentId>>, StoreError> {
            Self::injected(&self.fail_index_read, "index read")?;
            Ok(self
                .indexes
                .lock()
                .unwrap()
                .get(user)
                .map(|ids| ids.clone().unwrap_or_default()))
        }

        async fn set_tournament_index(&self, user: &UserId, ids: &[TournamentId]) -> Result<(), StoreError> {
            Self::injected(&self.fail_index_write, "index write")?;
            self.indexes
                .lock()
                .unwrap()
                .insert(user.clone(), Some(ids.to_vec()));
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}
