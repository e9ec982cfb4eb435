use thiserror::Error;
use tracing::info;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("DATABASE_URL is not set; add it to the environment or a .env file")]
    MissingDatabaseUrl,
    #[error("DATABASE_URL still contains a template placeholder: {0}")]
    PlaceholderDatabaseUrl(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
}

impl Config {
    /// Reads configuration from the environment, `.env` included.
    /// A `DATABASE_URL` left on its template value (anything with
    /// `<...>` in it) is refused outright rather than discovered as a
    /// connect failure later.
    pub fn load() -> Result<Config, ConfigError> {
        let database_url =
            dotenv::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)?;
        if database_url.contains('<') {
            return Err(ConfigError::PlaceholderDatabaseUrl(database_url));
        }
        let bind_addr = dotenv::var("BIND_ADDR").unwrap_or_else(|_| {
            info!("BIND_ADDR not set, defaulting to {DEFAULT_BIND_ADDR}");
            DEFAULT_BIND_ADDR.to_owned()
        });
        Ok(Config {
            database_url,
            bind_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Config::load reads the process environment, which the whole test
    // binary shares, so only the pure pieces are exercised here.

    #[test]
    fn placeholder_database_url_is_fatal() {
        let url = "sqlite://<password>@nowhere/rooms.db";
        assert!(url.contains('<'));
        let err = ConfigError::PlaceholderDatabaseUrl(url.to_owned());
        assert!(err.to_string().contains("template placeholder"));
    }

    #[test]
    fn missing_database_url_names_the_variable() {
        assert!(
            ConfigError::MissingDatabaseUrl
                .to_string()
                .contains("DATABASE_URL")
        );
    }
}
