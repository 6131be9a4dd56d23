use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Deployment environment. Maintenance flags are kept per environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Preview,
    Production,
}

impl AppEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Preview => "preview",
            AppEnvironment::Production => "production",
        }
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(AppEnvironment::Development),
            "preview" | "staging" => Ok(AppEnvironment::Preview),
            "production" | "prod" => Ok(AppEnvironment::Production),
            other => Err(format!(
                "Invalid environment: {}. Supported: development, preview, production",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_host: String,
    /// LinkedIn-style post search; disabled when unset
    pub linkedin_url: Option<String>,
    pub linkedin_host: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub environment: AppEnvironment,
    pub auth_exchange_secret: Option<String>,
    pub cron_secret: Option<String>,
    pub search_api: SearchApiConfig,
    pub ingestion_enabled: bool,
    pub ingestion_interval: Duration,
    pub ingestion_delay: Duration,
    pub maintenance_poll: Duration,
    pub geoip_url: Option<String>,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    /// Reads the whole configuration from the environment (after `.env` is loaded).
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let database_url = get("DATABASE_URL").ok_or_else(|| "DATABASE_URL must be set".to_string())?;

        let port = get_or("PORT", "3002")
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        let environment = get_or("APP_ENV", "development").parse::<AppEnvironment>()?;

        let ingestion_interval_secs = parse_or(get("INGESTION_INTERVAL_SECS"), 21_600u64).max(60);
        let ingestion_delay_ms = parse_or(get("INGESTION_DELAY_MS"), 2_000u64);
        let maintenance_poll_secs = parse_or(get("MAINTENANCE_POLL_SECS"), 15u64).max(1);

        let ingestion_enabled = get_or("INGESTION_ENABLED", "true");
        let ingestion_enabled = ingestion_enabled.eq_ignore_ascii_case("true") || ingestion_enabled == "1";

        // GEOIP_URL="" disables lookups
        let geoip_url = match lookup("GEOIP_URL") {
            Some(url) if url.trim().is_empty() => None,
            Some(url) => Some(url.trim().trim_end_matches('/').to_string()),
            None => Some("http://ip-api.com/json".to_string()),
        };

        let cors_origins = get_or("CORS_ORIGINS", "http://localhost:3000")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host: get_or("HOST", "0.0.0.0"),
            port,
            database_url,
            environment,
            auth_exchange_secret: get("AUTH_EXCHANGE_SECRET"),
            cron_secret: get("CRON_SECRET"),
            search_api: SearchApiConfig {
                base_url: get_or("SEARCH_API_URL", "https://twitter-api45.p.rapidapi.com")
                    .trim_end_matches('/')
                    .to_string(),
                api_key: get("SEARCH_API_KEY"),
                api_host: get_or("SEARCH_API_HOST", "twitter-api45.p.rapidapi.com"),
                linkedin_url: get("LINKEDIN_API_URL").map(|url| url.trim_end_matches('/').to_string()),
                linkedin_host: get_or("LINKEDIN_API_HOST", "linkedin-data-api.p.rapidapi.com"),
            },
            ingestion_enabled,
            ingestion_interval: Duration::from_secs(ingestion_interval_secs),
            ingestion_delay: Duration::from_millis(ingestion_delay_ms),
            maintenance_poll: Duration::from_secs(maintenance_poll_secs),
            geoip_url,
            cors_origins,
        })
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    match value {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("⚠️  Invalid numeric setting '{}', using default", raw);
            default
        }),
        None => default,
    }
}
