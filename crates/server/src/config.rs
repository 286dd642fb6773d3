//! Process configuration, read once at startup from the environment.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {0}")]
    InvalidVar(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    /// Shared secret for validating session tokens. The server never issues
    /// tokens, only checks them, so a missing secret is a startup error.
    pub jwt_secret: String,
    /// Allowed CORS origin; unset means any origin (development).
    pub cors_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("CORKBOARD_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = match lookup("CORKBOARD_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidVar("CORKBOARD_PORT"))?,
            None => 5000,
        };
        let database_path = lookup("CORKBOARD_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("corkboard.db"));
        let jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError::MissingVar("JWT_SECRET"))?;
        let cors_origin = lookup("CORS_ORIGIN").filter(|origin| !origin.trim().is_empty());

        Ok(Self {
            host,
            port,
            database_path,
            jwt_secret,
            cors_origin,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            pairs
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn defaults_apply_when_only_the_secret_is_set() {
        let config = Config::from_lookup(env(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 5000);
        assert_eq!(config.database_path, PathBuf::from("corkboard.db"));
        assert!(config.cors_origin.is_none());
        assert_eq!(config.listen_addr(), "127.0.0.1:5000");
    }

    #[test]
    fn missing_secret_is_a_startup_error() {
        assert!(matches!(
            Config::from_lookup(env(&[])),
            Err(ConfigError::MissingVar("JWT_SECRET"))
        ));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let result = Config::from_lookup(env(&[
            ("JWT_SECRET", "s3cret"),
            ("CORKBOARD_PORT", "not-a-port"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidVar("CORKBOARD_PORT"))));
    }

    #[test]
    fn overrides_are_honored() {
        let config = Config::from_lookup(env(&[
            ("JWT_SECRET", "s3cret"),
            ("CORKBOARD_HOST", "0.0.0.0"),
            ("CORKBOARD_PORT", "8080"),
            ("CORKBOARD_DB_PATH", "/var/lib/corkboard/data.db"),
            ("CORS_ORIGIN", "https://board.example.com"),
        ]))
        .unwrap();
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
        assert_eq!(
            config.cors_origin.as_deref(),
            Some("https://board.example.com")
        );
    }
}
