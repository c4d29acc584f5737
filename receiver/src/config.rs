//! Configuration module for environment variable parsing.

use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_from_env() {
        env::remove_var("PORT");
        assert_eq!(Config::from_env().port, 8080);

        env::set_var("PORT", "9099");
        assert_eq!(Config::from_env().port, 9099);

        env::set_var("PORT", "not-a-port");
        assert_eq!(Config::from_env().port, 8080);

        env::remove_var("PORT");
    }
}
