//! Database module for SQLite persistence.
//!
//! SQLite is the shared store for accounts, the current session, reports
//! and the read-only reference data.

mod repository;
pub mod seed;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Run embedded migrations
    run_migrations(&pool).await?;
    seed_reference_data(&pool).await?;
    backfill_report_wards(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            schema_version INTEGER NOT NULL DEFAULT 1,
            revision_id INTEGER NOT NULL DEFAULT 0,
            generated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        INSERT OR IGNORE INTO meta (id, schema_version, revision_id, generated_at)
        VALUES (1, 1, 0, datetime('now'));
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            role TEXT NOT NULL,
            phone TEXT,
            address TEXT,
            created_at TEXT NOT NULL,
            ward TEXT NOT NULL,
            ward_no INTEGER NOT NULL,
            version INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS credentials (
            email TEXT PRIMARY KEY,
            password_hash TEXT NOT NULL,
            user_id TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS session (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            token TEXT NOT NULL,
            user_snapshot TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reports (
            id INTEGER PRIMARY KEY,
            user_id TEXT NOT NULL,
            user_name TEXT NOT NULL,
            description TEXT NOT NULL,
            location TEXT NOT NULL,
            ward TEXT,
            ward_no INTEGER,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            date TEXT NOT NULL,
            image TEXT,
            priority TEXT NOT NULL,
            priority_reason TEXT,
            near_sensitive_area INTEGER NOT NULL DEFAULT 0,
            sensitive_area TEXT,
            status TEXT NOT NULL,
            assigned_worker_id TEXT,
            lifecycle TEXT NOT NULL,
            version INTEGER NOT NULL DEFAULT 1
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS wards (
            ward_no INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            readiness INTEGER NOT NULL,
            pumps INTEGER NOT NULL,
            personnel INTEGER NOT NULL,
            vehicles INTEGER NOT NULL,
            hotspots INTEGER NOT NULL,
            last_maintenance TEXT NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            boundary TEXT
        );

        CREATE TABLE IF NOT EXISTS hotspots (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            risk TEXT NOT NULL,
            last_flooded TEXT NOT NULL,
            depth TEXT NOT NULL,
            duration TEXT NOT NULL,
            description TEXT,
            ward_no INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sensitive_areas (
            id TEXT PRIMARY KEY,
            area_type TEXT NOT NULL,
            name TEXT NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            ward TEXT NOT NULL,
            ward_no INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS alerts (
            id TEXT PRIMARY KEY,
            severity TEXT NOT NULL,
            location TEXT NOT NULL,
            ward TEXT,
            ward_no INTEGER,
            message TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            is_read INTEGER NOT NULL DEFAULT 0
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_users_ward_no ON users(ward_no);
        CREATE INDEX IF NOT EXISTS idx_users_role ON users(role);
        CREATE INDEX IF NOT EXISTS idx_reports_user_id ON reports(user_id);
        CREATE INDEX IF NOT EXISTS idx_reports_ward_no ON reports(ward_no);
        CREATE INDEX IF NOT EXISTS idx_reports_assigned_worker ON reports(assigned_worker_id);
        CREATE INDEX IF NOT EXISTS idx_sensitive_areas_ward_no ON sensitive_areas(ward_no);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert the static reference data. Existing rows are left alone.
async fn seed_reference_data(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    for ward in seed::WARDS {
        let boundary = serde_json::to_string(ward.boundary).ok();
        sqlx::query(
            "INSERT OR IGNORE INTO wards (ward_no, name, readiness, pumps, personnel, vehicles, hotspots, last_maintenance, latitude, longitude, boundary) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(ward.ward_no)
        .bind(ward.name)
        .bind(ward.readiness)
        .bind(ward.pumps)
        .bind(ward.personnel)
        .bind(ward.vehicles)
        .bind(ward.hotspots)
        .bind(ward.last_maintenance)
        .bind(ward.coords[0])
        .bind(ward.coords[1])
        .bind(&boundary)
        .execute(&mut *tx)
        .await?;
    }

    for hotspot in seed::hotspots() {
        sqlx::query(
            "INSERT OR IGNORE INTO hotspots (id, name, latitude, longitude, risk, last_flooded, depth, duration, description, ward_no) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&hotspot.id)
        .bind(&hotspot.name)
        .bind(hotspot.coords[0])
        .bind(hotspot.coords[1])
        .bind(hotspot.risk.as_str())
        .bind(&hotspot.last_flooded)
        .bind(&hotspot.depth)
        .bind(&hotspot.duration)
        .bind(&hotspot.description)
        .bind(hotspot.ward_no)
        .execute(&mut *tx)
        .await?;
    }

    for area in seed::sensitive_areas() {
        sqlx::query(
            "INSERT OR IGNORE INTO sensitive_areas (id, area_type, name, latitude, longitude, ward, ward_no) VALUES (?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&area.id)
        .bind(area.area_type.as_str())
        .bind(&area.name)
        .bind(area.latitude)
        .bind(area.longitude)
        .bind(&area.ward)
        .bind(area.ward_no)
        .execute(&mut *tx)
        .await?;
    }

    for alert in seed::alerts() {
        sqlx::query(
            "INSERT OR IGNORE INTO alerts (id, severity, location, ward, ward_no, message, timestamp, is_read) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&alert.id)
        .bind(alert.severity.as_str())
        .bind(&alert.location)
        .bind(&alert.ward)
        .bind(alert.ward_no)
        .bind(&alert.message)
        .bind(&alert.timestamp)
        .bind(alert.is_read as i32)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Fill in the ward of legacy reports that only carry a free-text location,
/// matching ward names case-insensitively. Longer names win so that e.g.
/// "Mayur Vihar" is not shadowed by a shorter ward name.
async fn backfill_report_wards(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE reports SET
            ward_no = (
                SELECT w.ward_no FROM wards w
                WHERE instr(lower(reports.location), lower(w.name)) > 0
                ORDER BY length(w.name) DESC LIMIT 1
            ),
            ward = (
                SELECT w.name FROM wards w
                WHERE instr(lower(reports.location), lower(w.name)) > 0
                ORDER BY length(w.name) DESC LIMIT 1
            )
        WHERE ward_no IS NULL
        "#,
    )
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        tracing::info!(
            "Backfilled ward for {} legacy reports",
            result.rows_affected()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.sqlite");

        let pool = init_database(&db_path).await.unwrap();
        pool.close().await;
        let pool = init_database(&db_path).await.unwrap();

        let (wards,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM wards")
            .fetch_one(&pool)
            .await
            .unwrap();
        let (alerts,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM alerts")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(wards, seed::WARDS.len() as i64);
        assert_eq!(alerts, 12);
    }

    #[tokio::test]
    async fn test_backfill_matches_ward_name_in_location() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.sqlite");
        let pool = init_database(&db_path).await.unwrap();

        sqlx::query(
            "INSERT INTO reports (id, user_id, user_name, description, location, latitude, longitude, date, priority, status, lifecycle) VALUES (1, 'u', 'U', 'Flooded lane', 'Sector 9, ROHINI, Delhi', 28.71, 77.11, '2024-08-15T10:00:00+00:00', 'Medium', 'Pending', '{\"status\":\"Pending\"}')"
        )
        .execute(&pool)
        .await
        .unwrap();

        backfill_report_wards(&pool).await.unwrap();

        let (ward, ward_no): (String, i64) =
            sqlx::query_as("SELECT ward, ward_no FROM reports WHERE id = 1")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(ward, "Rohini");
        assert_eq!(ward_no, 8);
    }
}
