//! User, credential and session models.

use serde::{Deserialize, Serialize};

/// Ward every self-registered account belongs to.
pub const DEFAULT_WARD: &str = "Rohini";
pub const DEFAULT_WARD_NO: i64 = 8;

/// Ward number used for accounts with city-wide reach.
pub const CITY_WIDE_WARD_NO: i64 = 0;

/// Account role. Each role logs in through its own form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    WardAdmin,
    SuperAdmin,
    FieldWorker,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::WardAdmin => "ward_admin",
            Role::SuperAdmin => "super_admin",
            Role::FieldWorker => "field_worker",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "ward_admin" => Some(Role::WardAdmin),
            "super_admin" => Some(Role::SuperAdmin),
            "field_worker" => Some(Role::FieldWorker),
            _ => None,
        }
    }

    /// Human-readable name used in notifications.
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::WardAdmin => "Ward Admin",
            Role::SuperAdmin => "Super Admin",
            Role::FieldWorker => "Field Worker",
        }
    }
}

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub created_at: String,
    pub ward: String,
    pub ward_no: i64,
    /// Internal version for optimistic concurrency control
    #[serde(default)]
    pub version: i64,
}

/// Stored login secret, kept apart from the user record.
#[derive(Debug, Clone)]
pub struct Credential {
    pub email: String,
    pub password_hash: String,
    pub user_id: String,
}

/// The single active session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
    pub created_at: String,
}

/// Request body for creating an account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: Role,
}

/// Request body for logging in through a role-specific form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Successful login payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Profile fields a user may change about themselves.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Expected version for optimistic concurrency control
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Normalize an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
