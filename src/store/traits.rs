//! The `Database` trait — the seam between the facade and the backend.

use async_trait::async_trait;

use crate::error::DatabaseError;
use crate::model::{Room, User};

/// Backend-agnostic database trait covering users and rooms.
#[async_trait]
pub trait Database: Send + Sync {
    /// Exact-match credential lookup. `None` when no user matches.
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, DatabaseError>;

    /// Insert a new user. Returns the generated row id.
    ///
    /// A duplicate `username` yields [`DatabaseError::Constraint`].
    async fn create_user(
        &self,
        username: &str,
        password: &str,
        fullname: &str,
    ) -> Result<i64, DatabaseError>;

    /// All rooms, ordered by ascending id. Freshly queried each call.
    async fn list_rooms(&self) -> Result<Vec<Room>, DatabaseError>;

    /// Point lookup by primary key. `None` when the id does not exist.
    async fn get_room(&self, id: i64) -> Result<Option<Room>, DatabaseError>;
}
