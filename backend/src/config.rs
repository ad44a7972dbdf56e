use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use sqlx::postgres::PgConnectOptions;
use tracing::{info, warn};

use crate::error::{SagipError, SagipResult};

const INSECURE_JWT_SECRET: &str = "insecure-development-secret-key-replace-me-immediately";

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database: PgConnectOptions,
    pub jwt_secret: String,
    pub upload_dir: PathBuf,
    pub admin_email: String,
    pub admin_password: String,
}

impl Config {
    pub fn load() -> SagipResult<Self> {
        Ok(Self {
            port: try_load("PORT", "5000")?,
            database: database_options()?,
            jwt_secret: jwt_secret(),
            upload_dir: PathBuf::from(var_or("UPLOAD_DIR", "uploads")),
            admin_email: var_or("ADMIN_EMAIL", "admin@sagip.com"),
            admin_password: var_or("ADMIN_PASSWORD", "admin123"),
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn var_or(key: &str, default: &str) -> String {
    var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> SagipResult<T>
where
    T::Err: Display,
{
    var_or(key, default)
        .parse()
        .map_err(|e| SagipError::Validation(format!("Invalid {key} value: {e}")))
}

/// `DATABASE_URL` wins; otherwise the options are assembled from the
/// discrete `DB_*` variables.
fn database_options() -> SagipResult<PgConnectOptions> {
    if let Some(url) = var("DATABASE_URL") {
        return PgConnectOptions::from_str(&url)
            .map_err(|e| SagipError::Validation(format!("Invalid DATABASE_URL: {e}")));
    }
    Ok(options_from_parts(
        &var_or("DB_HOST", "localhost"),
        try_load("DB_PORT", "5432")?,
        &var_or("DB_USER", "postgres"),
        var("DB_PASS").as_deref(),
        &var_or("DB_NAME", "sagip"),
    ))
}

/// Parts are set field by field, never spliced into a URL, so credentials
/// may contain any character.
fn options_from_parts(
    host: &str,
    port: u16,
    user: &str,
    password: Option<&str>,
    name: &str,
) -> PgConnectOptions {
    let opts = PgConnectOptions::new()
        .host(host)
        .port(port)
        .username(user)
        .database(name);
    match password {
        Some(password) => opts.password(password),
        None => opts,
    }
}

fn jwt_secret() -> String {
    var("JWT_SECRET").unwrap_or_else(|| {
        warn!("JWT_SECRET not set, using insecure default!");
        INSECURE_JWT_SECRET.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_options_from_discrete_parts() {
        let opts = options_from_parts("db", 5433, "sagip", None, "catalog");
        assert_eq!(opts.get_host(), "db");
        assert_eq!(opts.get_port(), 5433);
        assert_eq!(opts.get_username(), "sagip");
        assert_eq!(opts.get_database(), Some("catalog"));
    }

    #[test]
    fn reserved_characters_in_credentials_stay_in_their_fields() {
        let opts = options_from_parts("dbhost", 5432, "sa@gip", Some("p@ss/w#rd:1"), "sagip");
        assert_eq!(opts.get_host(), "dbhost");
        assert_eq!(opts.get_port(), 5432);
        assert_eq!(opts.get_username(), "sa@gip");
        assert_eq!(opts.get_database(), Some("sagip"));
        assert!(format!("{opts:?}").contains("p@ss/w#rd:1"));
    }
}
