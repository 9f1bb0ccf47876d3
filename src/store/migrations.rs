//! Version-tracked database migrations.
//!
//! Each migration has a version number and an apply function.
//! `run_migrations()` checks the current version and applies only the
//! new ones sequentially. Column-adding steps check the live schema
//! before altering it, so re-running against a database at any earlier
//! version is safe. On first run against a legacy DB (tables exist, no
//! `_migrations` table), it records V1 without re-creating tables.

use libsql::{Connection, params};

use crate::error::DatabaseError;

/// A single migration step.
struct Migration {
    version: i64,
    name: &'static str,
}

/// All migrations in order. Add new versions to the end.
static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
    },
    Migration {
        version: 2,
        name: "room_amenities",
    },
    Migration {
        version: 3,
        name: "room_images",
    },
];

/// Fixture users seeded on first creation (demo logins 1/1 and 2/2).
const SEED_USERS: &[(&str, &str, &str)] = &[
    ("1", "1", "Иван Иванов"),
    ("2", "2", "Пётр Петров"),
];

/// A fixture room. Row id is position in [`SEED_ROOMS`] plus one.
struct SeedRoom {
    number: &'static str,
    capacity: i64,
    price: f64,
    description: &'static str,
    is_available: bool,
    amenities: &'static str,
    image_res: &'static str,
}

/// Fixture rooms seeded on first creation. The V2/V3 backfills read
/// from the same table, so a migrated database ends up identical to a
/// freshly created one.
const SEED_ROOMS: &[SeedRoom] = &[
    SeedRoom {
        number: "101",
        capacity: 2,
        price: 1500.0,
        description: "Уютный номер с видом",
        is_available: true,
        amenities: "WiFi, Кондиционер, ТВ",
        image_res: "room_101",
    },
    SeedRoom {
        number: "102",
        capacity: 4,
        price: 2500.0,
        description: "Семейный номер",
        is_available: true,
        amenities: "WiFi, Кондиционер, ТВ, Холодильник",
        image_res: "room_102",
    },
    SeedRoom {
        number: "201",
        capacity: 2,
        price: 1200.0,
        description: "Эконом",
        is_available: false,
        amenities: "WiFi, ТВ",
        image_res: "room_201",
    },
    SeedRoom {
        number: "202",
        capacity: 3,
        price: 1800.0,
        description: "Улучшенный",
        is_available: true,
        amenities: "WiFi, Кондиционер, ТВ, Минибар",
        image_res: "room_202",
    },
];

/// Run all pending migrations against the given connection.
///
/// Creates the `_migrations` table if it doesn't exist. Detects legacy
/// databases (a `rooms` table exists but `_migrations` is empty) and
/// records V1 without re-running schema DDL.
pub async fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("Failed to create _migrations table: {e}")))?;

    let mut current_version = get_current_version(conn).await?;

    // Legacy DB: schema created before version tracking existed. The
    // tables match V1; any later columns already present are skipped by
    // the column checks below.
    if current_version == 0 && legacy_tables_exist(conn).await? {
        record_version(conn, 1, "initial_schema").await?;
        current_version = 1;
        tracing::info!("Legacy database detected — recorded migration V1");
    }

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            apply(conn, migration.version).await.map_err(|e| {
                DatabaseError::Migration(format!(
                    "Migration V{} ({}) failed: {e}",
                    migration.version, migration.name
                ))
            })?;
            record_version(conn, migration.version, migration.name).await?;
        }
    }

    tracing::info!(
        version = MIGRATIONS.last().map(|m| m.version).unwrap_or(0),
        "Database migrations complete"
    );

    Ok(())
}

/// Apply a single migration step.
async fn apply(conn: &Connection, version: i64) -> Result<(), DatabaseError> {
    match version {
        1 => initial_schema(conn).await,
        2 => room_amenities(conn).await,
        3 => room_images(conn).await,
        other => Err(DatabaseError::Migration(format!(
            "No apply step for version V{other}"
        ))),
    }
}

/// V1 — create the `users` and `rooms` tables and seed fixture rows.
async fn initial_schema(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            fullname TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS rooms (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            number TEXT NOT NULL,
            capacity INTEGER NOT NULL,
            price REAL NOT NULL,
            description TEXT,
            is_available INTEGER NOT NULL DEFAULT 1
        );",
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("initial_schema DDL: {e}")))?;

    for (username, password, fullname) in SEED_USERS {
        conn.execute(
            "INSERT INTO users (username, password, fullname) VALUES (?1, ?2, ?3)",
            params![*username, *password, *fullname],
        )
        .await
        .map_err(|e| DatabaseError::Migration(format!("seed user {username}: {e}")))?;
    }

    for room in SEED_ROOMS {
        conn.execute(
            "INSERT INTO rooms (number, capacity, price, description, is_available)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                room.number,
                room.capacity,
                room.price,
                room.description,
                i64::from(room.is_available),
            ],
        )
        .await
        .map_err(|e| DatabaseError::Migration(format!("seed room {}: {e}", room.number)))?;
    }

    Ok(())
}

/// V2 — add the `amenities` column and backfill the fixture rows by id.
async fn room_amenities(conn: &Connection) -> Result<(), DatabaseError> {
    if column_exists(conn, "rooms", "amenities").await? {
        return Ok(());
    }

    conn.execute("ALTER TABLE rooms ADD COLUMN amenities TEXT", ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("add amenities column: {e}")))?;

    for (i, room) in SEED_ROOMS.iter().enumerate() {
        conn.execute(
            "UPDATE rooms SET amenities = ?1 WHERE id = ?2",
            params![room.amenities, (i + 1) as i64],
        )
        .await
        .map_err(|e| DatabaseError::Migration(format!("backfill amenities: {e}")))?;
    }

    Ok(())
}

/// V3 — add the `image_res` column and backfill by room number.
async fn room_images(conn: &Connection) -> Result<(), DatabaseError> {
    if column_exists(conn, "rooms", "image_res").await? {
        return Ok(());
    }

    conn.execute("ALTER TABLE rooms ADD COLUMN image_res TEXT", ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("add image_res column: {e}")))?;

    for room in SEED_ROOMS {
        conn.execute(
            "UPDATE rooms SET image_res = ?1 WHERE number = ?2",
            params![room.image_res, room.number],
        )
        .await
        .map_err(|e| DatabaseError::Migration(format!("backfill image_res: {e}")))?;
    }

    Ok(())
}

/// Get the highest applied migration version, or 0 if none.
async fn get_current_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("Failed to query migration version: {e}")))?;

    let row = rows
        .next()
        .await
        .map_err(|e| DatabaseError::Migration(format!("Failed to read migration version: {e}")))?;

    match row {
        Some(row) => {
            let version: i64 = row.get(0).map_err(|e| {
                DatabaseError::Migration(format!("Failed to parse migration version: {e}"))
            })?;
            Ok(version)
        }
        None => Ok(0),
    }
}

/// Check whether a column exists on a table.
async fn column_exists(
    conn: &Connection,
    table: &str,
    column: &str,
) -> Result<bool, DatabaseError> {
    let mut rows = conn
        .query(
            "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
            params![table, column],
        )
        .await
        .map_err(|e| DatabaseError::Migration(format!("table_info({table}): {e}")))?;

    let row = rows
        .next()
        .await
        .map_err(|e| DatabaseError::Migration(format!("table_info({table}): {e}")))?;

    match row {
        Some(row) => {
            let count: i64 = row.get(0).unwrap_or(0);
            Ok(count > 0)
        }
        None => Ok(false),
    }
}

/// Check if legacy tables (rooms, users) already exist.
async fn legacy_tables_exist(conn: &Connection) -> Result<bool, DatabaseError> {
    let mut rows = conn
        .query(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='rooms'",
            (),
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("Failed to check legacy tables: {e}")))?;

    let row = rows
        .next()
        .await
        .map_err(|e| DatabaseError::Query(format!("Failed to read legacy check: {e}")))?;

    match row {
        Some(row) => {
            let count: i64 = row.get(0).unwrap_or(0);
            Ok(count > 0)
        }
        None => Ok(false),
    }
}

/// Insert a version record into `_migrations`.
async fn record_version(conn: &Connection, version: i64, name: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR IGNORE INTO _migrations (version, name) VALUES (?1, ?2)",
        params![version, name],
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("Failed to record migration V{version}: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_conn() -> Connection {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .unwrap();
        db.connect().unwrap()
    }

    async fn table_exists(conn: &Connection, table: &str) -> bool {
        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                params![table],
            )
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let count: i64 = row.get(0).unwrap();
        count == 1
    }

    async fn room_field(conn: &Connection, number: &str, field: &str) -> Option<String> {
        let mut rows = conn
            .query(
                &format!("SELECT {field} FROM rooms WHERE number = ?1"),
                params![number],
            )
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        row.get(0).ok()
    }

    #[tokio::test]
    async fn migrations_create_all_tables() {
        let conn = test_conn().await;
        run_migrations(&conn).await.unwrap();

        for table in &["users", "rooms", "_migrations"] {
            assert!(table_exists(&conn, table).await, "Table '{table}' should exist");
        }
    }

    #[tokio::test]
    async fn migrations_seed_fixture_rows() {
        let conn = test_conn().await;
        run_migrations(&conn).await.unwrap();

        let mut rows = conn
            .query("SELECT COUNT(*) FROM rooms", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let rooms: i64 = row.get(0).unwrap();
        assert_eq!(rooms, 4);

        let mut rows = conn
            .query("SELECT COUNT(*) FROM users", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let users: i64 = row.get(0).unwrap();
        assert_eq!(users, 2);
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let conn = test_conn().await;
        run_migrations(&conn).await.unwrap();
        // Running again should not fail and should not duplicate seeds
        run_migrations(&conn).await.unwrap();

        let version = get_current_version(&conn).await.unwrap();
        assert_eq!(version, 3);

        let mut rows = conn
            .query("SELECT COUNT(*) FROM rooms", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let rooms: i64 = row.get(0).unwrap();
        assert_eq!(rooms, 4);
    }

    #[tokio::test]
    async fn legacy_db_migrates_to_current() {
        let conn = test_conn().await;

        // Simulate a V1-era DB: tables created by hand, rows present,
        // no _migrations table and no amenities/image_res columns.
        conn.execute_batch(
            "CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                fullname TEXT NOT NULL
            );
            CREATE TABLE rooms (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                number TEXT NOT NULL,
                capacity INTEGER NOT NULL,
                price REAL NOT NULL,
                description TEXT,
                is_available INTEGER NOT NULL DEFAULT 1
            );
            INSERT INTO rooms (number, capacity, price, description, is_available) VALUES
                ('101', 2, 1500.0, 'Уютный номер с видом', 1),
                ('102', 4, 2500.0, 'Семейный номер', 1),
                ('201', 2, 1200.0, 'Эконом', 0),
                ('202', 3, 1800.0, 'Улучшенный', 1);",
        )
        .await
        .unwrap();

        run_migrations(&conn).await.unwrap();

        let version = get_current_version(&conn).await.unwrap();
        assert_eq!(version, 3);

        // Both added columns must be backfilled for every fixture row.
        assert_eq!(
            room_field(&conn, "101", "amenities").await.as_deref(),
            Some("WiFi, Кондиционер, ТВ")
        );
        assert_eq!(
            room_field(&conn, "202", "amenities").await.as_deref(),
            Some("WiFi, Кондиционер, ТВ, Минибар")
        );
        assert_eq!(
            room_field(&conn, "201", "image_res").await.as_deref(),
            Some("room_201")
        );
    }

    #[tokio::test]
    async fn legacy_db_matches_fresh_initialization() {
        // Fresh DB
        let fresh = test_conn().await;
        run_migrations(&fresh).await.unwrap();

        // Legacy V1 DB migrated forward
        let legacy = test_conn().await;
        legacy
            .execute_batch(
                "CREATE TABLE users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    username TEXT NOT NULL UNIQUE,
                    password TEXT NOT NULL,
                    fullname TEXT NOT NULL
                );
                CREATE TABLE rooms (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    number TEXT NOT NULL,
                    capacity INTEGER NOT NULL,
                    price REAL NOT NULL,
                    description TEXT,
                    is_available INTEGER NOT NULL DEFAULT 1
                );
                INSERT INTO rooms (number, capacity, price, description, is_available) VALUES
                    ('101', 2, 1500.0, 'Уютный номер с видом', 1),
                    ('102', 4, 2500.0, 'Семейный номер', 1),
                    ('201', 2, 1200.0, 'Эконом', 0),
                    ('202', 3, 1800.0, 'Улучшенный', 1);",
            )
            .await
            .unwrap();
        run_migrations(&legacy).await.unwrap();

        for conn in [&fresh, &legacy] {
            for room in SEED_ROOMS {
                assert_eq!(
                    room_field(conn, room.number, "amenities").await.as_deref(),
                    Some(room.amenities)
                );
                assert_eq!(
                    room_field(conn, room.number, "image_res").await.as_deref(),
                    Some(room.image_res)
                );
            }
        }
    }

    #[tokio::test]
    async fn version_tracking() {
        let conn = test_conn().await;
        run_migrations(&conn).await.unwrap();

        let mut rows = conn
            .query("SELECT version, name FROM _migrations ORDER BY version", ())
            .await
            .unwrap();

        let expected = [(1, "initial_schema"), (2, "room_amenities"), (3, "room_images")];
        for (version, name) in expected {
            let row = rows.next().await.unwrap().unwrap();
            let v: i64 = row.get(0).unwrap();
            let n: String = row.get(1).unwrap();
            assert_eq!(v, version);
            assert_eq!(n, name);
        }
    }
}
