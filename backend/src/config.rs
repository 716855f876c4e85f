use std::env;
use std::fmt::Display;
use std::str::FromStr;

use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable {0} is required")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_address: String,
    pub port: u16,
    pub inference_url: Url,
    pub perenual_base_url: String,
    pub perenual_api_key: Option<String>,
    pub database_url: String,
    pub jwt_secret: String,
    pub cookie_secure: bool,
    pub bcrypt_cost: u32,
    pub cors_origin: Option<String>,
    pub frontend_dir: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let backend_url = var("BACKEND_URL").unwrap_or_else(|| "http://localhost:5001".to_string());
        let inference_url = predict_url(&backend_url).map_err(|e| ConfigError::Invalid {
            key: "BACKEND_URL",
            reason: e.to_string(),
        })?;

        let jwt_secret = var("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let frontend_dir = var("FRONTEND_DIR").unwrap_or_else(|| {
            match env::var("CARGO_MANIFEST_DIR") {
                Ok(manifest_dir) => format!("{}/../frontend/dist", manifest_dir),
                Err(_) => "/usr/src/app/frontend/dist".to_string(),
            }
        });

        Ok(Self {
            bind_address: var("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or("PORT", var("PORT"), 8081)?,
            inference_url,
            perenual_base_url: var("PERENUAL_BASE_URL")
                .unwrap_or_else(|| "https://perenual.com/api".to_string())
                .trim_end_matches('/')
                .to_string(),
            perenual_api_key: var("PERENUAL_API_KEY"),
            database_url: var("DATABASE_URL").unwrap_or_else(|| "sqlite://plantdoc.db".to_string()),
            jwt_secret,
            cookie_secure: parse_or("COOKIE_SECURE", var("COOKIE_SECURE"), false)?,
            bcrypt_cost: parse_or("BCRYPT_COST", var("BCRYPT_COST"), 10)?,
            cors_origin: var("CORS_ORIGIN"),
            frontend_dir,
        })
    }
}

/// `{BACKEND_URL}/api/predict`, tolerating a trailing slash on the base.
pub fn predict_url(backend_url: &str) -> Result<Url, url::ParseError> {
    Url::parse(&format!("{}/api/predict", backend_url.trim_end_matches('/')))
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        None => {
            log::debug!("{} not set, using default", key);
            Ok(default)
        }
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
    }
}
