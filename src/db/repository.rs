//! Database repository for accounts, the session, reports and reference data.
//!
//! Uses prepared statements and transactions for data integrity.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    Alert, AlertSeverity, Credential, Datastore, Hotspot, Priority, Report, ReportState,
    ReportStatus, RevisionInfo, RiskLevel, Role, SensitiveArea, SensitiveAreaType, Session,
    UpdateProfileRequest, User, Ward, WardResources,
};

/// Which reports a caller may see.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportScope {
    All,
    Submitter(String),
    Ward(i64),
    Worker(String),
}

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

const USER_COLUMNS: &str =
    "id, name, email, role, phone, address, created_at, ward, ward_no, version";

const REPORT_COLUMNS: &str = "id, user_id, user_name, description, location, ward, ward_no, latitude, longitude, date, image, priority, priority_reason, near_sensitive_area, sensitive_area, status, lifecycle, version";

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Get revision info.
    pub async fn get_revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }

    /// Increment the revision ID and return the new value.
    pub async fn increment_revision(&self) -> Result<i64, AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&self.pool)
            .await?;
        self.get_revision_id().await
    }

    /// Get the city-wide snapshot of accounts and reports.
    pub async fn get_datastore(&self) -> Result<Datastore, AppError> {
        let meta =
            sqlx::query("SELECT schema_version, revision_id, generated_at FROM meta WHERE id = 1")
                .fetch_one(&self.pool)
                .await?;

        let users = self.list_users().await?;
        let reports = self.list_reports(&ReportScope::All).await?;

        Ok(Datastore {
            schema_version: meta.get("schema_version"),
            revision_id: meta.get("revision_id"),
            generated_at: meta.get("generated_at"),
            users,
            reports,
        })
    }

    // ==================== USER OPERATIONS ====================

    /// List all users.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM users ORDER BY created_at",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(user_from_row).collect())
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().and_then(user_from_row))
    }

    /// Find a user by an already normalized email.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE email = ?",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().and_then(user_from_row))
    }

    /// Field workers serving a ward.
    pub async fn list_field_workers(&self, ward_no: i64) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM users WHERE role = ? AND ward_no = ? ORDER BY name",
            USER_COLUMNS
        ))
        .bind(Role::FieldWorker.as_str())
        .bind(ward_no)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(user_from_row).collect())
    }

    /// Number of accounts registered in a ward, any role.
    pub async fn count_users_in_ward(&self, ward_no: i64) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM users WHERE ward_no = ?")
            .bind(ward_no)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("total"))
    }

    /// Insert a user and its credential in one transaction.
    ///
    /// The email must already be normalized. Fails with `DuplicateEmail`
    /// without writing anything when the email is taken; the unique indexes
    /// on both tables decide, and the transaction rolls back on drop.
    pub async fn create_account(&self, user: &User, password_hash: &str) -> Result<User, AppError> {
        // Must open with a write; a leading read pins a WAL snapshot that a
        // concurrent commit turns into SQLITE_BUSY_SNAPSHOT.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO users (id, name, email, role, phone, address, created_at, ward, ward_no, version) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1)"
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(&user.phone)
        .bind(&user.address)
        .bind(&user.created_at)
        .bind(&user.ward)
        .bind(user.ward_no)
        .execute(&mut *tx)
        .await
        .map_err(|e| duplicate_email_or(e, &user.email))?;

        sqlx::query("INSERT INTO credentials (email, password_hash, user_id) VALUES (?, ?, ?)")
            .bind(&user.email)
            .bind(password_hash)
            .bind(&user.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| duplicate_email_or(e, &user.email))?;

        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(User {
            version: 1,
            ..user.clone()
        })
    }

    /// Update profile fields with optimistic concurrency control.
    ///
    /// When the user holds the current session its snapshot is rewritten
    /// so that `currentUser` reflects the change.
    pub async fn update_profile(
        &self,
        id: &str,
        request: &UpdateProfileRequest,
    ) -> Result<User, AppError> {
        let existing = self
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(format!("User {} not found", id)))?;

        // Check version for optimistic concurrency
        if let Some(expected) = request.expected_version {
            if existing.version != expected {
                return Err(version_mismatch(expected, existing.version));
            }
        }

        let new_version = existing.version + 1;
        let name = request.name.as_ref().unwrap_or(&existing.name);
        let phone = request.phone.clone().or(existing.phone.clone());
        let address = request.address.clone().or(existing.address.clone());

        let result = sqlx::query(
            "UPDATE users SET name = ?, phone = ?, address = ?, version = ? WHERE id = ? AND version = ?"
        )
        .bind(name)
        .bind(&phone)
        .bind(&address)
        .bind(new_version)
        .bind(id)
        .bind(existing.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Race condition - version changed between read and write
            let current = self.get_user(id).await?;
            return Err(AppError::Conflict {
                message: "Concurrent modification detected".to_string(),
                current_version: current.map(|u| u.version).unwrap_or(0),
            });
        }

        let updated = User {
            name: name.clone(),
            phone,
            address,
            version: new_version,
            ..existing
        };

        let snapshot = serde_json::to_string(&updated)?;
        sqlx::query(
            "UPDATE session SET user_snapshot = ? WHERE id = 1 AND json_extract(user_snapshot, '$.id') = ?",
        )
        .bind(&snapshot)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(updated)
    }

    // ==================== CREDENTIAL & SESSION OPERATIONS ====================

    /// Find the credential for an already normalized email.
    pub async fn find_credential(&self, email: &str) -> Result<Option<Credential>, AppError> {
        let row = sqlx::query("SELECT email, password_hash, user_id FROM credentials WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| Credential {
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            user_id: row.get("user_id"),
        }))
    }

    /// Load the current session.
    ///
    /// A snapshot that no longer parses is cleared and reported as no session.
    pub async fn get_session(&self) -> Result<Option<Session>, AppError> {
        let row = sqlx::query("SELECT token, user_snapshot, created_at FROM session WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let snapshot: String = row.get("user_snapshot");
        match serde_json::from_str::<User>(&snapshot) {
            Ok(user) => Ok(Some(Session {
                token: row.get("token"),
                user,
                created_at: row.get("created_at"),
            })),
            Err(e) => {
                tracing::warn!("Discarding corrupted session snapshot: {}", e);
                self.clear_session().await?;
                Ok(None)
            }
        }
    }

    /// Replace the current session, invalidating any previous token.
    pub async fn replace_session(&self, session: &Session) -> Result<(), AppError> {
        let snapshot = serde_json::to_string(&session.user)?;
        sqlx::query(
            r#"INSERT INTO session (id, token, user_snapshot, created_at) VALUES (1, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                   token = excluded.token,
                   user_snapshot = excluded.user_snapshot,
                   created_at = excluded.created_at"#,
        )
        .bind(&session.token)
        .bind(&snapshot)
        .bind(&session.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Clear the current session. No-op when none exists.
    pub async fn clear_session(&self) -> Result<(), AppError> {
        sqlx::query("DELETE FROM session WHERE id = 1")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ==================== REPORT OPERATIONS ====================

    /// List reports visible in a scope, newest first.
    ///
    /// Rows that cannot be decoded are skipped.
    pub async fn list_reports(&self, scope: &ReportScope) -> Result<Vec<Report>, AppError> {
        let query = match scope {
            ReportScope::All => format!("SELECT {} FROM reports ORDER BY id DESC", REPORT_COLUMNS),
            ReportScope::Submitter(_) => format!(
                "SELECT {} FROM reports WHERE user_id = ? ORDER BY id DESC",
                REPORT_COLUMNS
            ),
            ReportScope::Ward(_) => format!(
                "SELECT {} FROM reports WHERE ward_no = ? ORDER BY id DESC",
                REPORT_COLUMNS
            ),
            ReportScope::Worker(_) => format!(
                "SELECT {} FROM reports WHERE assigned_worker_id = ? ORDER BY id DESC",
                REPORT_COLUMNS
            ),
        };

        let rows = match scope {
            ReportScope::All => sqlx::query(&query).fetch_all(&self.pool).await?,
            ReportScope::Submitter(id) | ReportScope::Worker(id) => {
                sqlx::query(&query).bind(id).fetch_all(&self.pool).await?
            }
            ReportScope::Ward(ward_no) => {
                sqlx::query(&query)
                    .bind(*ward_no)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(rows.iter().filter_map(report_from_row).collect())
    }

    /// Get a report by ID.
    pub async fn get_report(&self, id: i64) -> Result<Option<Report>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM reports WHERE id = ?",
            REPORT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().and_then(report_from_row))
    }

    /// Persist a new report.
    ///
    /// The ID is the creation time in milliseconds, bumped past the largest
    /// existing ID when that value is already taken.
    pub async fn create_report(&self, draft: &Report) -> Result<Report, AppError> {
        let sensitive_area = draft
            .sensitive_area_info
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let lifecycle = serde_json::to_string(&draft.state)?;
        let now_ms = Utc::now().timestamp_millis();

        // Must open with a write, so the next id is picked by the INSERT
        // itself rather than a prior SELECT.
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO reports (
                id, user_id, user_name, description, location, ward, ward_no,
                latitude, longitude, date, image, priority, priority_reason,
                near_sensitive_area, sensitive_area, status, assigned_worker_id,
                lifecycle, version
            ) VALUES (
                (SELECT MAX(?, COALESCE(MAX(id) + 1, 0)) FROM reports),
                ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1
            ) RETURNING id"#,
        )
        .bind(now_ms)
        .bind(&draft.user_id)
        .bind(&draft.user)
        .bind(&draft.description)
        .bind(&draft.location)
        .bind(&draft.ward)
        .bind(draft.ward_no)
        .bind(draft.latitude)
        .bind(draft.longitude)
        .bind(&draft.date)
        .bind(&draft.image)
        .bind(draft.priority.as_str())
        .bind(&draft.priority_reason)
        .bind(draft.near_sensitive_area as i32)
        .bind(&sensitive_area)
        .bind(draft.state.status().as_str())
        .bind(draft.state.assignment().map(|a| a.assigned_worker_id.as_str()))
        .bind(&lifecycle)
        .fetch_one(&mut *tx)
        .await?;

        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Report {
            id,
            version: 1,
            ..draft.clone()
        })
    }

    /// Move a report to a new lifecycle state with optimistic concurrency
    /// control.
    ///
    /// `transition` sees the stored report and returns the next state, or
    /// an error that aborts the update without writing.
    pub async fn transition_report<F>(
        &self,
        id: i64,
        expected_version: Option<i64>,
        transition: F,
    ) -> Result<Report, AppError>
    where
        F: FnOnce(&Report) -> Result<ReportState, AppError>,
    {
        let existing = self
            .get_report(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", id)))?;

        if let Some(expected) = expected_version {
            if existing.version != expected {
                return Err(version_mismatch(expected, existing.version));
            }
        }

        let next = transition(&existing)?;
        let new_version = existing.version + 1;
        let lifecycle = serde_json::to_string(&next)?;

        // Use conditional UPDATE with version check to prevent race conditions
        let result = sqlx::query(
            "UPDATE reports SET status = ?, assigned_worker_id = ?, lifecycle = ?, version = ? WHERE id = ? AND version = ?"
        )
        .bind(next.status().as_str())
        .bind(next.assignment().map(|a| a.assigned_worker_id.as_str()))
        .bind(&lifecycle)
        .bind(new_version)
        .bind(id)
        .bind(existing.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get_report(id).await?;
            return Err(AppError::Conflict {
                message: "Concurrent modification detected".to_string(),
                current_version: current.map(|r| r.version).unwrap_or(0),
            });
        }

        self.increment_revision().await?;

        Ok(Report {
            state: next,
            version: new_version,
            ..existing
        })
    }

    /// Delete a report.
    pub async fn delete_report(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM reports WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Report {} not found", id)));
        }

        self.increment_revision().await?;
        Ok(())
    }

    // ==================== REFERENCE DATA OPERATIONS ====================

    /// List all wards.
    pub async fn list_wards(&self) -> Result<Vec<Ward>, AppError> {
        let rows = sqlx::query(
            "SELECT ward_no, name, readiness, pumps, personnel, vehicles, hotspots, last_maintenance, latitude, longitude, boundary FROM wards ORDER BY ward_no"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(ward_from_row).collect())
    }

    /// Get a ward by number.
    pub async fn get_ward(&self, ward_no: i64) -> Result<Option<Ward>, AppError> {
        let row = sqlx::query(
            "SELECT ward_no, name, readiness, pumps, personnel, vehicles, hotspots, last_maintenance, latitude, longitude, boundary FROM wards WHERE ward_no = ?"
        )
        .bind(ward_no)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(ward_from_row))
    }

    /// List hotspots, optionally restricted to one ward.
    pub async fn list_hotspots(&self, ward_no: Option<i64>) -> Result<Vec<Hotspot>, AppError> {
        let rows = sqlx::query(
            "SELECT id, name, latitude, longitude, risk, last_flooded, depth, duration, description, ward_no FROM hotspots WHERE (? IS NULL OR ward_no = ?) ORDER BY CAST(id AS INTEGER), id"
        )
        .bind(ward_no)
        .bind(ward_no)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(hotspot_from_row).collect())
    }

    /// List sensitive areas, optionally restricted to one ward.
    pub async fn list_sensitive_areas(
        &self,
        ward_no: Option<i64>,
    ) -> Result<Vec<SensitiveArea>, AppError> {
        let rows = sqlx::query(
            "SELECT id, area_type, name, latitude, longitude, ward, ward_no FROM sensitive_areas WHERE (? IS NULL OR ward_no = ?) ORDER BY id"
        )
        .bind(ward_no)
        .bind(ward_no)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(sensitive_area_from_row).collect())
    }

    /// List alerts, optionally restricted to one ward, newest first.
    pub async fn list_alerts(&self, ward_no: Option<i64>) -> Result<Vec<Alert>, AppError> {
        let rows = sqlx::query(
            "SELECT id, severity, location, ward, ward_no, message, timestamp, is_read FROM alerts WHERE (? IS NULL OR ward_no = ?) ORDER BY timestamp DESC"
        )
        .bind(ward_no)
        .bind(ward_no)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(alert_from_row).collect())
    }
}

fn version_mismatch(expected: i64, current: i64) -> AppError {
    AppError::Conflict {
        message: format!(
            "Version mismatch: expected {}, current {}",
            expected, current
        ),
        current_version: current,
    }
}

fn duplicate_email_or(err: sqlx::Error, email: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::DuplicateEmail(email.to_string())
        }
        _ => err.into(),
    }
}

// Helper functions for row conversion

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> Option<User> {
    let id: String = row.get("id");
    let role_str: String = row.get("role");
    let Some(role) = Role::from_str(&role_str) else {
        tracing::warn!("Skipping user {} with unknown role {:?}", id, role_str);
        return None;
    };

    Some(User {
        id,
        name: row.get("name"),
        email: row.get("email"),
        role,
        phone: row.get("phone"),
        address: row.get("address"),
        created_at: row.get("created_at"),
        ward: row.get("ward"),
        ward_no: row.get("ward_no"),
        version: row.get("version"),
    })
}

fn report_from_row(row: &sqlx::sqlite::SqliteRow) -> Option<Report> {
    let id: i64 = row.get("id");

    let ward: Option<String> = row.get("ward");
    let ward_no: Option<i64> = row.get("ward_no");
    let (Some(ward), Some(ward_no)) = (ward, ward_no) else {
        tracing::warn!("Skipping report {} without a ward", id);
        return None;
    };

    let lifecycle: String = row.get("lifecycle");
    let state = match serde_json::from_str::<ReportState>(&lifecycle) {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!("Skipping report {} with corrupted lifecycle: {}", id, e);
            return None;
        }
    };

    let status_str: String = row.get("status");
    if ReportStatus::from_str(&status_str) != Some(state.status()) {
        tracing::warn!(
            "Skipping report {}: status column {:?} disagrees with lifecycle {}",
            id,
            status_str,
            state.status()
        );
        return None;
    }

    let priority_str: String = row.get("priority");
    let Some(priority) = Priority::from_str(&priority_str) else {
        tracing::warn!("Skipping report {} with unknown priority {:?}", id, priority_str);
        return None;
    };

    let sensitive_area_str: Option<String> = row.get("sensitive_area");
    let near_sensitive_area: i32 = row.get("near_sensitive_area");

    Some(Report {
        id,
        user_id: row.get("user_id"),
        user: row.get("user_name"),
        description: row.get("description"),
        location: row.get("location"),
        ward,
        ward_no,
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        date: row.get("date"),
        image: row.get("image"),
        priority,
        priority_reason: row.get("priority_reason"),
        near_sensitive_area: near_sensitive_area != 0,
        sensitive_area_info: sensitive_area_str.and_then(|s| serde_json::from_str(&s).ok()),
        state,
        version: row.get("version"),
    })
}

fn ward_from_row(row: &sqlx::sqlite::SqliteRow) -> Ward {
    let boundary_str: Option<String> = row.get("boundary");
    Ward {
        ward_no: row.get("ward_no"),
        name: row.get("name"),
        readiness: row.get("readiness"),
        resources: WardResources {
            pumps: row.get("pumps"),
            personnel: row.get("personnel"),
            vehicles: row.get("vehicles"),
        },
        hotspots: row.get("hotspots"),
        last_maintenance: row.get("last_maintenance"),
        coords: [row.get("latitude"), row.get("longitude")],
        boundary: boundary_str.and_then(|s| serde_json::from_str(&s).ok()),
    }
}

fn hotspot_from_row(row: &sqlx::sqlite::SqliteRow) -> Option<Hotspot> {
    let risk_str: String = row.get("risk");
    Some(Hotspot {
        id: row.get("id"),
        name: row.get("name"),
        coords: [row.get("latitude"), row.get("longitude")],
        risk: RiskLevel::from_str(&risk_str)?,
        last_flooded: row.get("last_flooded"),
        depth: row.get("depth"),
        duration: row.get("duration"),
        description: row.get("description"),
        ward_no: row.get("ward_no"),
    })
}

fn sensitive_area_from_row(row: &sqlx::sqlite::SqliteRow) -> Option<SensitiveArea> {
    let type_str: String = row.get("area_type");
    Some(SensitiveArea {
        id: row.get("id"),
        area_type: SensitiveAreaType::from_str(&type_str)?,
        name: row.get("name"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        ward: row.get("ward"),
        ward_no: row.get("ward_no"),
    })
}

fn alert_from_row(row: &sqlx::sqlite::SqliteRow) -> Option<Alert> {
    let severity_str: String = row.get("severity");
    let is_read: i32 = row.get("is_read");
    Some(Alert {
        id: row.get("id"),
        severity: AlertSeverity::from_str(&severity_str)?,
        location: row.get("location"),
        ward: row.get("ward"),
        ward_no: row.get("ward_no"),
        message: row.get("message"),
        timestamp: row.get("timestamp"),
        is_read: is_read != 0,
    })
}
