/*
 * Responsibility
 * - 環境変数や設定の読み込み (JWT secret, CORS 許可, body limit, 認証除外パターンなど)
 * - 設定値のバリデーション (不足・不正なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

pub const MIN_JWT_SECRET_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// `pattern=AUTHORITY` entry from `AUTH_AUTHORITY_RULES`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityRule {
    pub pattern: String,
    pub authority: String,
}

impl FromStr for AuthorityRule {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (pattern, authority) = raw.split_once('=').ok_or(())?;
        let (pattern, authority) = (pattern.trim(), authority.trim());
        if !pattern.starts_with('/') || authority.is_empty() {
            return Err(());
        }

        Ok(Self {
            pattern: pattern.to_string(),
            authority: authority.to_string(),
        })
    }
}

/// Account created at start-up so the service is usable without a user store.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    // HS512 signing/verification key for access tokens
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    pub access_token_ttl_seconds: u64,
    pub access_token_leeway_seconds: u64,

    pub max_upload_bytes: usize,
    pub request_timeout_seconds: u64,

    // Appended to the built-in allow-list
    pub auth_permit_patterns: Vec<String>,
    // Paths that need a specific authority, checked before the extra permits
    pub auth_authority_rules: Vec<AuthorityRule>,

    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key → value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = parse_or(&lookup, "PORT", 3000)?;
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        let cors_allowed_origins = comma_list(lookup("CORS_ALLOWED_ORIGINS"));

        let jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(ConfigError::Invalid("JWT_SECRET"));
        }

        let jwt_issuer = lookup("JWT_ISSUER")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let access_token_ttl_seconds = parse_or(&lookup, "ACCESS_TOKEN_TTL_SECONDS", 3600)?;
        if access_token_ttl_seconds == 0 {
            return Err(ConfigError::Invalid("ACCESS_TOKEN_TTL_SECONDS"));
        }
        let access_token_leeway_seconds = parse_or(&lookup, "ACCESS_TOKEN_LEEWAY_SECONDS", 60)?;

        let max_upload_bytes = parse_or(&lookup, "MAX_UPLOAD_BYTES", 1024 * 1024)?;
        let request_timeout_seconds = parse_or(&lookup, "REQUEST_TIMEOUT_SECONDS", 30)?;

        let auth_permit_patterns = comma_list(lookup("AUTH_PERMIT_PATTERNS"));
        if auth_permit_patterns.iter().any(|p| !p.starts_with('/')) {
            return Err(ConfigError::Invalid("AUTH_PERMIT_PATTERNS"));
        }

        let auth_authority_rules = comma_list(lookup("AUTH_AUTHORITY_RULES"))
            .iter()
            .map(|raw| raw.parse())
            .collect::<Result<Vec<AuthorityRule>, ()>>()
            .map_err(|_| ConfigError::Invalid("AUTH_AUTHORITY_RULES"))?;

        let bootstrap_admin = match (
            lookup("BOOTSTRAP_ADMIN_USERNAME"),
            lookup("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(password)) => Some(BootstrapAdmin { username, password }),
            (Some(_), None) => return Err(ConfigError::Missing("BOOTSTRAP_ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("BOOTSTRAP_ADMIN_USERNAME")),
            (None, None) => None,
        };

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            jwt_secret,
            jwt_issuer,
            access_token_ttl_seconds,
            access_token_leeway_seconds,
            max_upload_bytes,
            request_timeout_seconds,
            auth_permit_patterns,
            auth_authority_rules,
            bootstrap_admin,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

fn comma_list(raw: Option<String>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[("JWT_SECRET", SECRET)]).expect("config");

        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.app_env, AppEnv::Development);
        assert!(config.cors_allowed_origins.is_empty());
        assert_eq!(config.jwt_issuer, None);
        assert_eq!(config.access_token_ttl_seconds, 3600);
        assert_eq!(config.access_token_leeway_seconds, 60);
        assert_eq!(config.max_upload_bytes, 1024 * 1024);
        assert_eq!(config.request_timeout_seconds, 30);
        assert!(config.auth_permit_patterns.is_empty());
        assert!(config.auth_authority_rules.is_empty());
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn test_missing_secret() {
        let err = from_pairs(&[]).err();
        assert_eq!(err, Some(ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn test_short_secret_is_invalid() {
        let err = from_pairs(&[("JWT_SECRET", "too-short")]).err();
        assert_eq!(err, Some(ConfigError::Invalid("JWT_SECRET")));
    }

    #[test]
    fn test_unparsable_number_is_invalid() {
        let err = from_pairs(&[("JWT_SECRET", SECRET), ("MAX_UPLOAD_BYTES", "lots")]).err();
        assert_eq!(err, Some(ConfigError::Invalid("MAX_UPLOAD_BYTES")));
    }

    #[test]
    fn test_lists_and_env() {
        let config = from_pairs(&[
            ("JWT_SECRET", SECRET),
            ("APP_ENV", "Prod"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, ,https://b.example"),
            ("AUTH_PERMIT_PATTERNS", "/docs/**, /public/*"),
        ])
        .expect("config");

        assert!(config.app_env.is_production());
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(config.auth_permit_patterns, vec!["/docs/**", "/public/*"]);
    }

    #[test]
    fn test_relative_permit_pattern_is_invalid() {
        let err = from_pairs(&[("JWT_SECRET", SECRET), ("AUTH_PERMIT_PATTERNS", "docs/**")]).err();
        assert_eq!(err, Some(ConfigError::Invalid("AUTH_PERMIT_PATTERNS")));
    }

    #[test]
    fn test_authority_rules() {
        let config = from_pairs(&[
            ("JWT_SECRET", SECRET),
            (
                "AUTH_AUTHORITY_RULES",
                "/api/audit/** = ROLE_AUDITOR, /api/reports/*=ROLE_USER",
            ),
        ])
        .expect("config");

        assert_eq!(
            config.auth_authority_rules,
            vec![
                AuthorityRule {
                    pattern: "/api/audit/**".to_string(),
                    authority: "ROLE_AUDITOR".to_string(),
                },
                AuthorityRule {
                    pattern: "/api/reports/*".to_string(),
                    authority: "ROLE_USER".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_malformed_authority_rule_is_invalid() {
        for raw in ["/api/audit/**", "api/audit=ROLE_AUDITOR", "/api/audit/**="] {
            let err = from_pairs(&[("JWT_SECRET", SECRET), ("AUTH_AUTHORITY_RULES", raw)]).err();
            assert_eq!(err, Some(ConfigError::Invalid("AUTH_AUTHORITY_RULES")), "{raw}");
        }
    }

    #[test]
    fn test_bootstrap_admin_needs_both_values() {
        let err = from_pairs(&[("JWT_SECRET", SECRET), ("BOOTSTRAP_ADMIN_USERNAME", "root")]).err();
        assert_eq!(err, Some(ConfigError::Missing("BOOTSTRAP_ADMIN_PASSWORD")));

        let config = from_pairs(&[
            ("JWT_SECRET", SECRET),
            ("BOOTSTRAP_ADMIN_USERNAME", "root"),
            ("BOOTSTRAP_ADMIN_PASSWORD", "changeme"),
        ])
        .expect("config");
        assert_eq!(
            config.bootstrap_admin.map(|a| a.username),
            Some("root".to_string())
        );
    }
}
