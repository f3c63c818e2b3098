//! Identity and session handling.
//!
//! Passwords are stored as Argon2 PHC strings. There is at most one active
//! session; its bearer token is checked in constant time.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use subtle::ConstantTimeEq;

use crate::config::Config;
use crate::db::Repository;
use crate::errors::{AppError, AppErrorWithRevision};
use crate::models::{
    normalize_email, LoginRequest, LoginResponse, Report, Role, Session, SignupRequest, User,
    CITY_WIDE_WARD_NO, DEFAULT_WARD, DEFAULT_WARD_NO,
};

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Session user attached to the request by [`session_auth_layer`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// An administrative account that must always exist.
struct FixedAccount {
    id: &'static str,
    name: &'static str,
    email: &'static str,
    role: Role,
    phone: &'static str,
    ward: &'static str,
    ward_no: i64,
}

const FIXED_ACCOUNTS: [FixedAccount; 2] = [
    FixedAccount {
        id: "ward_admin_rohini",
        name: "Rohini Ward Administrator",
        email: "wardadmin@rohini.gov.in",
        role: Role::WardAdmin,
        phone: "+91 11 2345 6789",
        ward: DEFAULT_WARD,
        ward_no: DEFAULT_WARD_NO,
    },
    FixedAccount {
        id: "super_admin_delhi",
        name: "Delhi City Administrator",
        email: "superadmin@delhi.gov.in",
        role: Role::SuperAdmin,
        phone: "+91 11 1234 5678",
        ward: "Delhi (All Wards)",
        ward_no: CITY_WIDE_WARD_NO,
    },
];

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|_| AppError::Internal("Failed to hash password".to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Create the fixed administrative accounts that are missing.
///
/// Returns how many were created; zero on every run after the first.
pub async fn bootstrap_admin_accounts(
    repo: &Repository,
    config: &Config,
) -> Result<usize, AppError> {
    let mut created = 0;

    for account in &FIXED_ACCOUNTS {
        if repo.find_user_by_email(account.email).await?.is_some() {
            continue;
        }

        let password = match account.role {
            Role::SuperAdmin => &config.super_admin_password,
            _ => &config.ward_admin_password,
        };

        let user = User {
            id: account.id.to_string(),
            name: account.name.to_string(),
            email: account.email.to_string(),
            role: account.role,
            phone: Some(account.phone.to_string()),
            address: None,
            created_at: Utc::now().to_rfc3339(),
            ward: account.ward.to_string(),
            ward_no: account.ward_no,
            version: 1,
        };

        match repo.create_account(&user, &hash_password(password)?).await {
            Ok(_) => {
                tracing::info!("Created {} account {}", account.role.as_str(), account.email);
                created += 1;
            }
            // Another instance won the race
            Err(AppError::DuplicateEmail(_)) => {}
            Err(e) => return Err(e),
        }
    }

    Ok(created)
}

/// Register a new account. Does not touch the current session.
pub async fn signup(repo: &Repository, request: &SignupRequest) -> Result<User, AppError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }

    let email = normalize_email(&request.email);
    if !email.contains('@') {
        return Err(AppError::Validation(
            "Please enter a valid email address".to_string(),
        ));
    }

    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    if repo.find_credential(&email).await?.is_some() {
        return Err(AppError::DuplicateEmail(email));
    }

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.to_string(),
        email,
        role: request.role,
        phone: request
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string),
        address: None,
        created_at: Utc::now().to_rfc3339(),
        ward: DEFAULT_WARD.to_string(),
        ward_no: DEFAULT_WARD_NO,
        version: 1,
    };

    let password_hash = hash_password(&request.password)?;
    let user = repo.create_account(&user, &password_hash).await?;
    tracing::info!("Registered {} account {}", user.role.as_str(), user.id);
    Ok(user)
}

/// Log in through a role-specific form, replacing any current session.
pub async fn login(repo: &Repository, request: &LoginRequest) -> Result<LoginResponse, AppError> {
    let email = normalize_email(&request.email);

    let credential = repo
        .find_credential(&email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;
    if !verify_password(&request.password, &credential.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let user = repo
        .get_user(&credential.user_id)
        .await?
        .ok_or_else(|| AppError::UserNotFound("User data not found".to_string()))?;

    if user.role != request.role {
        return Err(AppError::RoleMismatch(format!(
            "This account is registered as {}, not {}. Please use the matching login",
            user.role.display_name(),
            request.role.display_name()
        )));
    }

    let session = Session {
        token: uuid::Uuid::new_v4().to_string(),
        user,
        created_at: Utc::now().to_rfc3339(),
    };
    repo.replace_session(&session).await?;
    tracing::info!("User {} logged in as {}", session.user.id, request.role.as_str());

    Ok(LoginResponse {
        token: session.token,
        user: session.user,
    })
}

/// Fail with `Forbidden` unless the user holds one of `roles`.
pub fn require_role(user: &User, roles: &[Role]) -> Result<(), AppError> {
    if roles.contains(&user.role) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "{} accounts cannot perform this action",
            user.role.display_name()
        )))
    }
}

/// Whether a report is within the user's scope.
pub fn can_view_report(user: &User, report: &Report) -> bool {
    match user.role {
        Role::User => report.user_id == user.id,
        Role::WardAdmin => report.ward_no == user.ward_no,
        Role::SuperAdmin => true,
        Role::FieldWorker => report
            .state
            .assignment()
            .is_some_and(|a| a.assigned_worker_id == user.id),
    }
}

/// Session authentication layer.
///
/// Requires `Authorization: Bearer <token>` matching the current session and
/// attaches the session user as [`CurrentUser`].
pub async fn session_auth_layer(
    repo: Arc<Repository>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(provided) = bearer_token(&request) else {
        return unauthorized_response("Please log in to continue");
    };

    let session = match repo.get_session().await {
        Ok(session) => session,
        Err(e) => {
            return AppErrorWithRevision {
                error: e,
                revision_id: 0,
            }
            .into_response()
        }
    };

    match session {
        Some(session) if constant_time_compare(&provided, &session.token) => {
            request.extensions_mut().insert(CurrentUser(session.user));
            next.run(request).await
        }
        _ => unauthorized_response("Session expired or invalid. Please log in again"),
    }
}

fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Create an unauthorized response.
fn unauthorized_response(message: &str) -> Response {
    AppErrorWithRevision {
        error: AppError::Unauthorized(message.to_string()),
        revision_id: 0,
    }
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReportState;

    fn user(id: &str, role: Role, ward_no: i64) -> User {
        User {
            id: id.into(),
            name: id.into(),
            email: format!("{}@example.com", id),
            role,
            phone: None,
            address: None,
            created_at: "2024-08-15T10:00:00+00:00".into(),
            ward: "Rohini".into(),
            ward_no,
            version: 1,
        }
    }

    fn report(owner: &str, ward_no: i64, state: ReportState) -> Report {
        Report {
            id: 1,
            user_id: owner.into(),
            user: owner.into(),
            description: "Flooded".into(),
            location: "Rohini, Delhi (28.7041, 77.1025)".into(),
            ward: "Rohini".into(),
            ward_no,
            latitude: 28.7041,
            longitude: 77.1025,
            date: "2024-08-15T10:00:00+00:00".into(),
            image: None,
            priority: crate::models::Priority::Medium,
            priority_reason: None,
            near_sensitive_area: false,
            sensitive_area_info: None,
            state,
            version: 1,
        }
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("token-123", "token-123"));
        assert!(!constant_time_compare("token-123", "token-124"));
        assert!(!constant_time_compare("short", "much-longer-token"));
        assert!(!constant_time_compare("", "not-empty"));
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("secret1").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(!hash.contains("secret1"));
        assert!(verify_password("secret1", &hash).unwrap());
        assert!(!verify_password("secret2", &hash).unwrap());
        assert!(verify_password("secret1", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_require_role() {
        let admin = user("a", Role::WardAdmin, 8);
        assert!(require_role(&admin, &[Role::WardAdmin]).is_ok());
        assert!(matches!(
            require_role(&admin, &[Role::User, Role::SuperAdmin]),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_report_visibility_per_role() {
        let assigned = ReportState::Assigned {
            assignment: crate::models::Assignment {
                assigned_worker_id: "fw".into(),
                assigned_worker_name: "FW".into(),
                assigned_at: "2024-08-15T11:00:00+00:00".into(),
            },
        };
        let own = report("citizen", 8, assigned);
        let other_ward = report("someone", 12, ReportState::Pending);

        let citizen = user("citizen", Role::User, 8);
        assert!(can_view_report(&citizen, &own));
        assert!(!can_view_report(&citizen, &other_ward));

        let ward_admin = user("wa", Role::WardAdmin, 8);
        assert!(can_view_report(&ward_admin, &own));
        assert!(!can_view_report(&ward_admin, &other_ward));

        let super_admin = user("sa", Role::SuperAdmin, CITY_WIDE_WARD_NO);
        assert!(can_view_report(&super_admin, &other_ward));

        let worker = user("fw", Role::FieldWorker, 8);
        assert!(can_view_report(&worker, &own));
        assert!(!can_view_report(&worker, &other_ward));
    }
}
