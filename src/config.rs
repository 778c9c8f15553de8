/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, JWT_SECRET, CORS 許可, route ごとの RoleSet など)
 * - 設定値のバリデーション (不足なら起動失敗)
 * - 起動時に一度だけ読み、以後 immutable
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::authz::RoleSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
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

/// Allowed roles for each role-gated route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRoles {
    pub list_users: RoleSet,
    pub delete_user: RoleSet,
}

impl Default for RouteRoles {
    fn default() -> Self {
        Self {
            list_users: RoleSet::admin_only(),
            delete_user: RoleSet::admin_only(),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub jwt_secret: String,
    pub auth_issuer: Option<String>,
    pub access_token_leeway_seconds: u64,
    pub auth_cookie_name: String,

    pub route_roles: RouteRoles,

    pub request_body_limit_bytes: usize,
    pub request_timeout_seconds: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the signing secret or credentials in DATABASE_URL
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("auth_issuer", &self.auth_issuer)
            .field("auth_cookie_name", &self.auth_cookie_name)
            .field("route_roles", &self.route_roles)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the process environment in production, a map in tests).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = get("PORT").and_then(|s| s.parse().ok()).unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let app_env = AppEnv::parse(&get("APP_ENV").unwrap_or_else(|| "development".to_string()));

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.is_empty() {
            return Err(ConfigError::Invalid("JWT_SECRET"));
        }

        let auth_issuer = get("AUTH_ISSUER")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let access_token_leeway_seconds = get("ACCESS_TOKEN_LEEWAY_SECONDS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);

        let auth_cookie_name = get("AUTH_COOKIE_NAME")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "token".to_string());

        let defaults = RouteRoles::default();
        let route_roles = RouteRoles {
            list_users: role_set(&get, "LIST_USERS_ROLES", defaults.list_users)?,
            delete_user: role_set(&get, "DELETE_USER_ROLES", defaults.delete_user)?,
        };

        let request_body_limit_bytes = get("REQUEST_BODY_LIMIT_BYTES")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(1024 * 1024);

        let request_timeout_seconds = get("REQUEST_TIMEOUT_SECONDS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(30);

        Ok(Self {
            addr,
            database_url,
            app_env,
            cors_allowed_origins,
            jwt_secret,
            auth_issuer,
            access_token_leeway_seconds,
            auth_cookie_name,
            route_roles,
            request_body_limit_bytes,
            request_timeout_seconds,
        })
    }
}

// A gate that allows nobody is always a mistake, so an empty list is rejected too.
fn role_set(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: RoleSet,
) -> Result<RoleSet, ConfigError> {
    let Some(raw) = get(key) else {
        return Ok(default);
    };
    let set = RoleSet::parse_list(&raw).map_err(|_| ConfigError::Invalid(key))?;
    if set.is_empty() {
        return Err(ConfigError::Invalid(key));
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::authz::Role;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("DATABASE_URL", "postgres://localhost/users"),
        ("JWT_SECRET", "s3cret"),
    ];

    #[test]
    fn defaults_apply() {
        let c = Config::from_lookup(lookup(REQUIRED)).unwrap();
        assert_eq!(c.addr.port(), 3000);
        assert_eq!(c.app_env, AppEnv::Development);
        assert_eq!(c.auth_cookie_name, "token");
        assert_eq!(c.auth_issuer, None);
        assert_eq!(c.route_roles, RouteRoles::default());
        assert_eq!(c.request_body_limit_bytes, 1024 * 1024);
        assert_eq!(c.request_timeout_seconds, 30);
    }

    #[test]
    fn required_keys_are_enforced() {
        let err = Config::from_lookup(lookup(&[("JWT_SECRET", "x")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));

        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "x")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));

        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "x"), ("JWT_SECRET", "")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::Invalid("JWT_SECRET"));
    }

    #[test]
    fn route_roles_are_parsed() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("DELETE_USER_ROLES", "admin, user"));
        let c = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(c.route_roles.delete_user, RoleSet::new([Role::User, Role::Admin]));
        assert_eq!(c.route_roles.list_users, RoleSet::admin_only());
    }

    #[test]
    fn bad_role_lists_fail_startup() {
        for bad in ["owner", " , "] {
            let mut pairs = REQUIRED.to_vec();
            pairs.push(("LIST_USERS_ROLES", bad));
            let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
            assert_eq!(err, ConfigError::Invalid("LIST_USERS_ROLES"));
        }
    }
}
