use axum::http::HeaderValue;
use core_config::{AppInfo, ConfigError, FromEnv, app_info, env_or_default, env_parse, server::ServerConfig};
use database::postgres::PostgresConfig;
use strum::{Display, EnumString};

// Re-export Environment for use in other modules
pub use core_config::Environment;

const DEFAULT_CORS_ORIGIN: &str = "http://localhost:4200";

/// Where products are kept
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StoreKind {
    Postgres,
    /// Process-local, lost on restart
    Memory,
}

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub server: ServerConfig,
    pub environment: Environment,
    pub store: StoreKind,
    /// Set exactly when `store` is `Postgres`
    pub database: Option<PostgresConfig>,
    pub run_migrations: bool,
    pub cors_origins: Vec<HeaderValue>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // Uses defaults: HOST=0.0.0.0, PORT=8080
        let store = env_parse("STORE", StoreKind::Postgres)?;

        let database = match store {
            StoreKind::Postgres => Some(PostgresConfig::from_env()?), // DATABASE_URL required
            StoreKind::Memory => None,
        };

        Ok(Self {
            app: app_info!(),
            server,
            environment,
            store,
            database,
            run_migrations: env_parse("RUN_MIGRATIONS", true)?,
            cors_origins: parse_origins(&env_or_default(
                "CORS_ALLOWED_ORIGIN",
                DEFAULT_CORS_ORIGIN,
            ))?,
        })
    }
}

/// Comma separated list of origins; blank entries are skipped
fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, ConfigError> {
    let origins = raw
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|e| ConfigError::ParseError {
                key: "CORS_ALLOWED_ORIGIN".to_string(),
                details: format!("{origin}: {e}"),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if origins.is_empty() {
        return Err(ConfigError::ParseError {
            key: "CORS_ALLOWED_ORIGIN".to_string(),
            details: "at least one origin is required".to_string(),
        });
    }

    Ok(origins)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 6] = [
        "APP_ENV",
        "STORE",
        "DATABASE_URL",
        "RUN_MIGRATIONS",
        "CORS_ALLOWED_ORIGIN",
        "PORT",
    ];

    fn with_env<F: FnOnce()>(set: &[(&str, &str)], f: F) {
        let vars: Vec<(&str, Option<&str>)> = VARS
            .iter()
            .map(|key| {
                let value = set.iter().find(|(k, _)| k == key).map(|(_, v)| *v);
                (*key, value)
            })
            .collect();
        temp_env::with_vars(vars, f);
    }

    #[test]
    fn test_postgres_is_the_default_store() {
        with_env(&[("DATABASE_URL", "postgresql://localhost/inventory")], || {
            let config = Config::from_env().unwrap();

            assert_eq!(config.store, StoreKind::Postgres);
            assert_eq!(
                config.database.unwrap().url,
                "postgresql://localhost/inventory"
            );
            assert!(config.run_migrations);
            assert_eq!(config.cors_origins, vec![DEFAULT_CORS_ORIGIN]);
            assert_eq!(config.server.port, 8080);
            assert_eq!(config.app.name, "inventory_api");
        });
    }

    #[test]
    fn test_postgres_store_requires_database_url() {
        with_env(&[], || {
            let err = Config::from_env().unwrap_err();
            assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "DATABASE_URL"));
        });
    }

    #[test]
    fn test_memory_store_needs_no_database() {
        with_env(&[("STORE", "Memory"), ("RUN_MIGRATIONS", "false")], || {
            let config = Config::from_env().unwrap();

            assert_eq!(config.store, StoreKind::Memory);
            assert!(config.database.is_none());
            assert!(!config.run_migrations);
        });
    }

    #[test]
    fn test_unknown_store_is_rejected() {
        with_env(&[("STORE", "mongo")], || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("STORE"));
        });
    }

    #[test]
    fn test_cors_origins_are_split_and_trimmed() {
        with_env(
            &[
                ("STORE", "memory"),
                (
                    "CORS_ALLOWED_ORIGIN",
                    "https://shop.example.com, http://localhost:4200,",
                ),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(
                    config.cors_origins,
                    vec!["https://shop.example.com", "http://localhost:4200"]
                );
            },
        );
    }

    #[test]
    fn test_blank_cors_origin_is_rejected() {
        assert!(parse_origins(" , ").is_err());
        assert!(parse_origins("http://bad\norigin").is_err());
    }
}
