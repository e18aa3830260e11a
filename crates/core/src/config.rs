use serde::Deserialize;

/// Root application configuration. Loaded from environment variables with
/// the prefix `OUTREACH__`. The database URL may also come from the plain
/// `DATABASE_URL` variable; it is consumed only by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// Consecutive hard errors tolerated before the campaign is failed.
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,
    /// Scroll/pause rounds used to trigger incremental listing loads.
    #[serde(default = "default_scrape_scroll_rounds")]
    pub scrape_scroll_rounds: usize,
    /// Listing entries extracted when the campaign does not set a limit.
    #[serde(default = "default_scrape_limit")]
    pub default_scrape_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_headless")]
    pub headless: bool,
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,
}

fn default_max_consecutive_errors() -> u32 {
    3
}
fn default_scrape_scroll_rounds() -> usize {
    5
}
fn default_scrape_limit() -> usize {
    50
}
fn default_headless() -> bool {
    true
}
fn default_navigation_timeout_ms() -> u64 {
    30_000
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_consecutive_errors: default_max_consecutive_errors(),
            scrape_scroll_rounds: default_scrape_scroll_rounds(),
            default_scrape_limit: default_scrape_limit(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            worker: WorkerConfig::default(),
            browser: BrowserConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("OUTREACH")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let mut app: AppConfig = config.try_deserialize()?;
        if app.database_url.is_none() {
            app.database_url = std::env::var("DATABASE_URL").ok();
        }
        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.worker.max_consecutive_errors, 3);
        assert_eq!(config.worker.scrape_scroll_rounds, 5);
        assert_eq!(config.worker.default_scrape_limit, 50);
        assert!(config.browser.headless);
        assert!(config.database_url.is_none());
    }
}
