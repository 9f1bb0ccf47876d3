//! FrontDesk — the operation surface consumed by presentation code.

use std::sync::Arc;

use tracing::debug;

use crate::error::{DatabaseError, RegisterError};
use crate::model::{Room, User};
use crate::store::Database;

/// Thin facade over the storage backend.
///
/// Stateless between calls; all state lives in the database.
pub struct FrontDesk {
    db: Arc<dyn Database>,
}

impl FrontDesk {
    /// Create a new facade over the given backend.
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Exact-match credential check. `None` when the credentials don't
    /// match any user.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, DatabaseError> {
        self.db.authenticate(username, password).await
    }

    /// Register a new account.
    ///
    /// A duplicate username is reported as [`RegisterError::UsernameTaken`]
    /// instead of surfacing the storage-level constraint violation.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        fullname: &str,
    ) -> Result<(), RegisterError> {
        match self.db.create_user(username, password, fullname).await {
            Ok(id) => {
                debug!(user_id = id, username, "User registered");
                Ok(())
            }
            Err(DatabaseError::Constraint(_)) => Err(RegisterError::UsernameTaken {
                username: username.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// All rooms, available or not, ordered by ascending id.
    pub async fn list_all_rooms(&self) -> Result<Vec<Room>, DatabaseError> {
        self.db.list_rooms().await
    }

    /// Room detail lookup. `None` when the id does not exist.
    pub async fn get_room(&self, id: i64) -> Result<Option<Room>, DatabaseError> {
        self.db.get_room(id).await
    }

    /// Available rooms that fit at least `min_guests`.
    ///
    /// Filtered over the full listing, keeping its ascending-id order.
    /// Fine at four rows — a larger inventory would push the predicate
    /// into the query.
    pub async fn search_available(&self, min_guests: u32) -> Result<Vec<Room>, DatabaseError> {
        let rooms = self.db.list_rooms().await?;
        Ok(rooms
            .into_iter()
            .filter(|r| r.is_available && r.capacity >= min_guests)
            .collect())
    }
}
