use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL database connection URL. Without one the service keeps its
    /// state in memory, which is only suitable for local development.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Redis connection URL. Catalog responses are not cached when unset.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Movie catalog API base URL
    #[serde(default = "default_catalog_api_url")]
    pub catalog_api_url: String,

    /// CDN prefix for relative poster and thumbnail paths
    #[serde(default = "default_catalog_cdn_url")]
    pub catalog_cdn_url: String,

    /// Timeout applied to every catalog request, in seconds
    #[serde(default = "default_catalog_timeout_secs")]
    pub catalog_timeout_secs: u64,

    /// Upper bound on listing pages fetched when scanning for hidden movies
    #[serde(default = "default_hidden_scan_max_pages")]
    pub hidden_scan_max_pages: u32,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_catalog_api_url() -> String {
    "https://phimapi.com".to_string()
}

fn default_catalog_cdn_url() -> String {
    "https://phimimg.com".to_string()
}

fn default_catalog_timeout_secs() -> u64 {
    10
}

fn default_hidden_scan_max_pages() -> u32 {
    10
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Socket address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_when_unset() {
        let vars: Vec<(String, String)> = vec![];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.database_url, None);
        assert_eq!(config.redis_url, None);
        assert_eq!(config.catalog_api_url, "https://phimapi.com");
        assert_eq!(config.catalog_cdn_url, "https://phimimg.com");
        assert_eq!(config.catalog_timeout_secs, 10);
        assert_eq!(config.hidden_scan_max_pages, 10);
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_overrides_from_environment() {
        let vars = vec![
            (
                "DATABASE_URL".to_string(),
                "postgres://localhost/movies".to_string(),
            ),
            ("HIDDEN_SCAN_MAX_PAGES".to_string(), "3".to_string()),
            ("PORT".to_string(), "8080".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/movies")
        );
        assert_eq!(config.hidden_scan_max_pages, 3);
        assert_eq!(config.port, 8080);
    }
}
