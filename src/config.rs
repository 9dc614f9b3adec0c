//! Application configuration module
//!
//! Handles loading and validating configuration from environment variables.

use serde::Deserialize;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
#[allow(dead_code)]
pub enum ConfigError {
    #[error("Failed to load environment variables: {0}")]
    EnvLoad(#[from] dotenvy::Error),

    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::new(0, 0, 0, 0), // Bind to 0.0.0.0 for Docker
            port: 3000,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3001".to_string()],
        }
    }
}

/// Policy applied to admin routes that have no declared role rule.
///
/// The reference behavior is `Allow`: new screens ship before their role
/// rule is added, and an undeclared route is open to any authenticated
/// session. `Deny` closes that window at the cost of breaking undeclared
/// screens until a rule is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultPolicy {
    Allow,
    Deny,
}

impl DefaultPolicy {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_lowercase().as_str() {
            "allow" => Ok(DefaultPolicy::Allow),
            "deny" => Ok(DefaultPolicy::Deny),
            other => Err(ConfigError::InvalidValue(format!(
                "ROUTE_DEFAULT_POLICY must be 'allow' or 'deny', got '{}'",
                other
            ))),
        }
    }
}

/// Authentication and authorization configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Name of the session cookie carrying the compact token
    pub cookie_name: String,
    /// Path prefix under which the edge gate is active
    pub admin_prefix: String,
    /// Secret used to sign issued session tokens
    pub jwt_secret: String,
    /// Issued token lifetime in hours
    pub token_ttl_hours: i64,
    /// Policy for admin routes with no declared role rule
    pub default_policy: DefaultPolicy,
    /// Permission cache refresh cadence in milliseconds
    pub refresh_interval_ms: u64,
    /// Optional path for the persisted session record; in-memory when unset
    pub session_file: Option<PathBuf>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: "cleanops_session".to_string(),
            admin_prefix: "/admin".to_string(),
            jwt_secret: String::new(),
            token_ttl_hours: 12,
            default_policy: DefaultPolicy::Allow,
            refresh_interval_ms: 1000,
            session_file: None,
        }
    }
}

/// Complete application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub auth: AuthConfig,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();

        let server = ServerConfig {
            host: std::env::var("HOST")
                .ok()
                .and_then(|h| h.parse().ok())
                .unwrap_or_else(|| ServerConfig::default().host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(|| ServerConfig::default().port),
        };

        let cors = CorsConfig {
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|| CorsConfig::default().allowed_origins),
        };

        let defaults = AuthConfig::default();
        let auth = AuthConfig {
            cookie_name: std::env::var("SESSION_COOKIE")
                .unwrap_or(defaults.cookie_name),
            admin_prefix: std::env::var("ADMIN_PREFIX")
                .unwrap_or(defaults.admin_prefix),
            jwt_secret: std::env::var("JWT_SECRET")
                .map_err(|_| ConfigError::MissingVar("JWT_SECRET".to_string()))?,
            token_ttl_hours: std::env::var("TOKEN_TTL_HOURS")
                .ok()
                .map(|v| {
                    v.parse::<i64>().map_err(|_| {
                        ConfigError::InvalidValue(
                            "TOKEN_TTL_HOURS must be a valid integer".to_string(),
                        )
                    })
                })
                .transpose()?
                .unwrap_or(defaults.token_ttl_hours),
            default_policy: std::env::var("ROUTE_DEFAULT_POLICY")
                .ok()
                .map(|v| DefaultPolicy::parse(&v))
                .transpose()?
                .unwrap_or(defaults.default_policy),
            refresh_interval_ms: std::env::var("PERMISSION_REFRESH_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.refresh_interval_ms),
            session_file: std::env::var("SESSION_FILE").ok().map(PathBuf::from),
        };

        if auth.jwt_secret.len() < 16 {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET must be at least 16 characters".to_string(),
            ));
        }
        if !auth.admin_prefix.starts_with('/') || auth.admin_prefix.ends_with('/') {
            return Err(ConfigError::InvalidValue(
                "ADMIN_PREFIX must start with '/' and not end with '/'".to_string(),
            ));
        }

        Ok(Self { server, cors, auth })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_server_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, Ipv4Addr::new(0, 0, 0, 0));
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_default_auth_config() {
        let config = AuthConfig::default();
        assert_eq!(config.cookie_name, "cleanops_session");
        assert_eq!(config.admin_prefix, "/admin");
        assert_eq!(config.default_policy, DefaultPolicy::Allow);
        assert_eq!(config.refresh_interval_ms, 1000);
    }

    #[test]
    fn test_default_policy_parse() {
        assert_eq!(DefaultPolicy::parse("allow").unwrap(), DefaultPolicy::Allow);
        assert_eq!(DefaultPolicy::parse(" DENY ").unwrap(), DefaultPolicy::Deny);
        assert!(DefaultPolicy::parse("open").is_err());
    }
}
