use std::time::Duration;

pub const DEFAULT_POSTHOG_HOST: &str = "https://us.posthog.com";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Base URL of the PostHog instance, without a trailing slash.
    pub posthog_host: String,
    /// JSON document listing every tenant and its query templates.
    pub tenants_path: String,
    pub upstream_timeout_secs: u64,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            port: std::env::var("KPILENS_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            posthog_host: std::env::var("KPILENS_POSTHOG_HOST")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_POSTHOG_HOST.to_string()),
            tenants_path: std::env::var("KPILENS_TENANTS_PATH")
                .unwrap_or_else(|_| "./tenants.json".to_string()),
            upstream_timeout_secs: std::env::var("KPILENS_UPSTREAM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            cors_origins: std::env::var("KPILENS_CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            posthog_host: DEFAULT_POSTHOG_HOST.to_string(),
            tenants_path: "./tenants.json".to_string(),
            upstream_timeout_secs: DEFAULT_UPSTREAM_TIMEOUT_SECS,
            cors_origins: Vec::new(),
        }
    }
}
