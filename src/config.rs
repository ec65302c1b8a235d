use std::env;

/// Deployment environment. Controls cookie security flags and how much error
/// detail is exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub environment: Environment,
    /// Lifetime of the `jwt` session cookie, in days.
    pub cookie_expires_days: i64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            environment: if is_development() {
                Environment::Development
            } else {
                Environment::Production
            },
            cookie_expires_days: env::var("COOKIE_EXPIRES_DAYS")
                .unwrap_or_else(|_| "7".to_string())
                .parse()
                .expect("COOKIE_EXPIRES_DAYS must be a number"),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

/// Anything other than `APP_ENV=production` counts as development.
pub fn is_development() -> bool {
    env::var("APP_ENV").map(|v| v != "production").unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("DATABASE_URL", "postgres://test");
        env::remove_var("APP_ENV");

        let config = Config::from_env();

        assert_eq!(config.database_url, "postgres://test");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.cookie_expires_days, 7);
        assert!(!config.is_production());

        env::set_var("SERVER_PORT", "3000");
        env::set_var("SERVER_HOST", "0.0.0.0");
        env::set_var("COOKIE_EXPIRES_DAYS", "30");

        let config = Config::from_env();

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.cookie_expires_days, 30);

        env::remove_var("SERVER_PORT");
        env::remove_var("SERVER_HOST");
        env::remove_var("COOKIE_EXPIRES_DAYS");
    }
}
