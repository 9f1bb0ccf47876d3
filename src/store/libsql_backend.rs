//! libSQL backend — async `Database` trait implementation.
//!
//! Supports local file and in-memory databases. Every statement is
//! parameterized; nothing is spliced into SQL text.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::model::{PLACEHOLDER_IMAGE, Room, User};
use crate::store::migrations;
use crate::store::traits::Database;

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Open(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Open(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Open(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(backend.conn()).await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Open(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Open(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(backend.conn()).await?;
        Ok(backend)
    }

    /// Get the connection.
    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Row mapping ─────────────────────────────────────────────────────

/// Map a libsql Row to a User.
///
/// Column order matches USER_COLUMNS: 0:id, 1:username, 2:password, 3:fullname
fn row_to_user(row: &libsql::Row) -> Result<User, libsql::Error> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        fullname: row.get(3)?,
    })
}

/// Map a libsql Row to a Room.
///
/// Column order matches ROOM_COLUMNS:
/// 0:id, 1:number, 2:capacity, 3:price, 4:description, 5:is_available,
/// 6:amenities, 7:image_res
///
/// Rows written before V2/V3 may have NULL in the last two columns;
/// `amenities` stays `None` and `image_res` falls back to the
/// placeholder asset.
fn row_to_room(row: &libsql::Row) -> Result<Room, libsql::Error> {
    let capacity: i64 = row.get(2)?;
    let is_available: i64 = row.get(5)?;
    Ok(Room {
        id: row.get(0)?,
        number: row.get(1)?,
        capacity: capacity as u32,
        price: row.get(3)?,
        description: row.get(4).ok(),
        is_available: is_available != 0,
        amenities: row.get(6).ok(),
        image_res: row
            .get::<String>(7)
            .unwrap_or_else(|_| PLACEHOLDER_IMAGE.to_string()),
    })
}

// ── Trait implementation ────────────────────────────────────────────

const USER_COLUMNS: &str = "id, username, password, fullname";

const ROOM_COLUMNS: &str =
    "id, number, capacity, price, description, is_available, amenities, image_res";

#[async_trait]
impl Database for LibSqlBackend {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {USER_COLUMNS} FROM users WHERE username = ?1 AND password = ?2"
                ),
                params![username, password],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("authenticate: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let user = row_to_user(&row)
                    .map_err(|e| DatabaseError::Query(format!("authenticate row parse: {e}")))?;
                debug!(user_id = user.id, username, "User authenticated");
                Ok(Some(user))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("authenticate: {e}"))),
        }
    }

    async fn create_user(
        &self,
        username: &str,
        password: &str,
        fullname: &str,
    ) -> Result<i64, DatabaseError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO users (username, password, fullname) VALUES (?1, ?2, ?3)",
            params![username, password, fullname],
        )
        .await
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("UNIQUE constraint failed") {
                DatabaseError::Constraint(format!("users.username: {username}"))
            } else {
                DatabaseError::Query(format!("create_user: {e}"))
            }
        })?;

        let id = conn.last_insert_rowid();
        debug!(user_id = id, username, "User created");
        Ok(id)
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(&format!("SELECT {ROOM_COLUMNS} FROM rooms ORDER BY id"), ())
            .await
            .map_err(|e| DatabaseError::Query(format!("list_rooms: {e}")))?;

        let mut rooms = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let room = row_to_room(&row)
                .map_err(|e| DatabaseError::Query(format!("list_rooms row parse: {e}")))?;
            rooms.push(room);
        }
        Ok(rooms)
    }

    async fn get_room(&self, id: i64) -> Result<Option<Room>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_room: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let room = row_to_room(&row)
                    .map_err(|e| DatabaseError::Query(format!("get_room row parse: {e}")))?;
                Ok(Some(room))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_room: {e}"))),
        }
    }
}
