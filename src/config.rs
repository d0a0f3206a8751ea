use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::internal::models::FeedSource;

/// Outlets aggregated by the app, in display order.
pub const DEFAULT_FEEDS: &[(&str, &str)] = &[
    (
        "El País",
        "https://feeds.elpais.com/mrss-s/pages/ep/site/elpais.com/section/ultimas-noticias/portada",
    ),
    ("El Mundo", "https://e00-elmundo.uecdn.es/rss/portada.xml"),
    ("El Diario", "https://www.eldiario.es/rss"),
    ("La Vanguardia", "https://www.lavanguardia.com/rss/home.xml"),
    (
        "El Periódico",
        "https://www.elperiodico.com/es/cds/rss/?id=board.xml",
    ),
    ("ABC", "https://www.abc.es/rss/2.0/portada/"),
    ("El Español", "https://www.elespanol.com/rss/"),
    ("20 Minutos", "https://www.20minutos.es/rss/"),
    ("Huff Post", "https://www.huffingtonpost.es/feeds/index.xml"),
];

pub const DEFAULT_ENDPOINT: &str = "https://api.rss2json.com/v1/api.json";

/// The compiled-in feed list as owned sources.
pub fn default_feeds() -> Vec<FeedSource> {
    DEFAULT_FEEDS
        .iter()
        .map(|(name, url)| FeedSource::new(*name, *url))
        .collect()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct NetworkConfig {
    /// RSS-to-JSON conversion endpoint; the feed URL is passed as `rss_url`.
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Extra attempts per source after a failed one. 0 disables retries.
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 10,
            max_retries: 0,
            retry_delay_ms: 500,
        }
    }
}

impl NetworkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 10 * 60 }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: 15 * 60,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base level for the `EnvFilter` when `RUST_LOG` is unset.
    pub level: String,
    /// Per-module overrides, e.g. `{"reqwest": "warn"}`.
    pub module_levels: HashMap<String, String>,
    /// Directory for the rolling log file. Defaults to `logs`.
    pub log_directory: Option<String>,
    pub enable_performance_metrics: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            module_levels: HashMap::new(),
            log_directory: None,
            enable_performance_metrics: false,
        }
    }
}

impl LoggingConfig {
    /// Filter directive string built from `level` and `module_levels`.
    pub fn filter_directives(&self) -> String {
        let mut modules: Vec<_> = self.module_levels.iter().collect();
        modules.sort();
        let mut filter_str = self.level.clone();
        for (module, level) in modules {
            filter_str.push_str(&format!(",{}={}", module, level));
        }
        filter_str
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct UiConfig {
    /// How often the terminal appearance is re-probed. 0 disables watching.
    pub system_theme_poll_secs: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            system_theme_poll_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub cache: CacheConfig,
    pub refresh: RefreshConfig,
    pub logging: LoggingConfig,
    pub ui: UiConfig,
    /// Optional JSON theme file with `dark` and `light` variants.
    pub theme_file: Option<String>,
    /// Where the key-value store lives. Defaults to `<config_dir>/tui-headlines`.
    pub storage_dir: Option<String>,
}

impl AppConfig {
    pub fn load() -> Self {
        // Look for config.ron in current directory or next to executable
        let mut candidates = vec![PathBuf::from("config.ron")];

        if let Ok(exe) = std::env::current_exe()
            && let Some(dir) = exe.parent()
        {
            candidates.push(dir.join("config.ron"));
        }

        for path in candidates {
            if path.exists()
                && let Ok(content) = fs::read_to_string(&path)
            {
                match Self::parse(&content) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::error!("Failed to parse config at {}: {:#}", path.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Self::default()
    }

    pub fn parse(content: &str) -> Result<Self> {
        ron::from_str::<AppConfig>(content).context("invalid config.ron")
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    /// Auto-refresh period. Zero is not a valid period and falls back to
    /// the default.
    pub fn refresh_interval(&self) -> Duration {
        match self.refresh.interval_secs {
            0 => {
                let fallback = RefreshConfig::default().interval_secs;
                tracing::warn!(fallback, "refresh.interval_secs must be positive, using default");
                Duration::from_secs(fallback)
            }
            secs => Duration::from_secs(secs),
        }
    }

    pub fn log_directory(&self) -> &str {
        self.logging.log_directory.as_deref().unwrap_or("logs")
    }
}
