use std::env;

/// Runtime configuration, read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub static_dir: String,
    /// Empty means any origin is allowed.
    pub cors_allowed_origins: Vec<String>,
}

const DEFAULT_PORT: u16 = 3051;

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!("⚠️  Invalid PORT '{}', falling back to {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        AppConfig {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "mongodb://localhost:27017/mtec".to_string()),
            static_dir: lookup("STATIC_DIR").unwrap_or_else(|| "public".to_string()),
            cors_allowed_origins,
        }
    }
}
