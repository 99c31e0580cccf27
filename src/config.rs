use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL database connection URL. Without it the service runs on the in-memory store.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Redis connection URL. Without it the top-rated list is not cached.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of recommendations returned when the caller gives no limit
    #[serde(default = "default_recommendation_limit")]
    pub default_recommendation_limit: usize,

    /// Upper bound applied to caller-provided limits
    #[serde(default = "default_max_recommendation_limit")]
    pub max_recommendation_limit: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_recommendation_limit() -> usize {
    10
}

fn default_max_recommendation_limit() -> usize {
    50
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            redis_url: None,
            host: default_host(),
            port: default_port(),
            default_recommendation_limit: default_recommendation_limit(),
            max_recommendation_limit: default_max_recommendation_limit(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.default_recommendation_limit == 0 || self.max_recommendation_limit == 0 {
            anyhow::bail!("Recommendation limits must be positive");
        }
        if self.default_recommendation_limit > self.max_recommendation_limit {
            anyhow::bail!(
                "DEFAULT_RECOMMENDATION_LIMIT ({}) exceeds MAX_RECOMMENDATION_LIMIT ({})",
                self.default_recommendation_limit,
                self.max_recommendation_limit
            );
        }
        Ok(())
    }

    /// Socket address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_env() {
        let config: Config = envy::from_iter(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config.database_url, None);
        assert_eq!(config.port, 3000);
        assert_eq!(config.default_recommendation_limit, 10);
        assert_eq!(config.max_recommendation_limit, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reads_overrides() {
        let vars = vec![
            ("DATABASE_URL".to_string(), "postgres://localhost/tastebud".to_string()),
            ("PORT".to_string(), "8080".to_string()),
            ("MAX_RECOMMENDATION_LIMIT".to_string(), "25".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/tastebud"));
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.max_recommendation_limit, 25);
    }

    #[test]
    fn test_default_above_max_is_rejected() {
        let config = Config {
            default_recommendation_limit: 60,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
