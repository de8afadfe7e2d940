//! Environment-driven server configuration.

use std::{env, fmt::Display, str::FromStr};

use pluma_auth::AuthConfig;
use pluma_db::DbConfig;
use tracing::{info, warn};

pub struct Config {
    pub db: DbConfig,
    pub auth: AuthConfig,
}

impl Config {
    pub fn load() -> Self {
        let db = DbConfig {
            url: try_load("PLUMA_DB_URL", "127.0.0.1:8000"),
            namespace: try_load("PLUMA_DB_NAMESPACE", "pluma"),
            database: try_load("PLUMA_DB_DATABASE", "main"),
            username: try_load("PLUMA_DB_USER", "root"),
            password: try_load("PLUMA_DB_PASSWORD", "root"),
        };

        let auth = AuthConfig {
            pepper: optional("PLUMA_PASSWORD_PEPPER"),
            jwt_private_key_pem: try_load("PLUMA_JWT_PRIVATE_KEY_PEM", ""),
            jwt_public_key_pem: try_load("PLUMA_JWT_PUBLIC_KEY_PEM", ""),
            admin_email: try_load("PLUMA_ADMIN_EMAIL", "admin@pluma.dev"),
            admin_password_hash: try_load("PLUMA_ADMIN_PASSWORD_HASH", ""),
            ..AuthConfig::default()
        };

        Self { db, auth }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}
