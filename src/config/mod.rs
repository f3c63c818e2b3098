//! Configuration module for the waterlog backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Distance in meters under which a report counts as near a sensitive area
    pub sensitive_radius_m: f64,
    /// Password for the bootstrapped Rohini ward admin account
    pub ward_admin_password: String,
    /// Password for the bootstrapped city super admin account
    pub super_admin_password: String,
    /// Buffer size of the report update broadcast channel
    pub event_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let db_path = env::var("WATERLOG_DB_PATH")
            .unwrap_or_else(|_| "./data/waterlog.sqlite".to_string())
            .into();

        let bind_addr = env::var("WATERLOG_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid WATERLOG_BIND_ADDR format");

        let log_level = env::var("WATERLOG_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let sensitive_radius_m = env::var("WATERLOG_SENSITIVE_RADIUS_M")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(750.0);

        let ward_admin_password = env::var("WATERLOG_WARD_ADMIN_PASSWORD")
            .unwrap_or_else(|_| "wardadmin123".to_string());

        let super_admin_password = env::var("WATERLOG_SUPER_ADMIN_PASSWORD")
            .unwrap_or_else(|_| "superadmin123".to_string());

        let event_capacity = env::var("WATERLOG_EVENT_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(64);

        Self {
            db_path,
            bind_addr,
            log_level,
            sensitive_radius_m,
            ward_admin_password,
            super_admin_password,
            event_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("WATERLOG_DB_PATH");
        env::remove_var("WATERLOG_BIND_ADDR");
        env::remove_var("WATERLOG_LOG_LEVEL");
        env::remove_var("WATERLOG_SENSITIVE_RADIUS_M");
        env::remove_var("WATERLOG_WARD_ADMIN_PASSWORD");
        env::remove_var("WATERLOG_SUPER_ADMIN_PASSWORD");
        env::remove_var("WATERLOG_EVENT_CAPACITY");

        let config = Config::from_env();

        assert_eq!(config.db_path, PathBuf::from("./data/waterlog.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.sensitive_radius_m, 750.0);
        assert_eq!(config.ward_admin_password, "wardadmin123");
        assert_eq!(config.super_admin_password, "superadmin123");
        assert_eq!(config.event_capacity, 64);
    }
}
