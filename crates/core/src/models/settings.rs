use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::CoreError;

use super::period::Period;
use super::portfolio::Holding;
use super::section::Section;

/// Environment variable that overrides `api_base_url`.
pub const API_URL_ENV: &str = "STOCK_DASHBOARD_API_URL";

/// Shortest query that may reach the search endpoint.
pub const MIN_SEARCH_LEN: usize = 2;

/// Runtime configuration of the dashboard core.
///
/// Every field has a default, so a partial JSON document is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    /// Backend base path, e.g. `http://localhost:5000/api`.
    pub api_base_url: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Cadence of the portfolio and watchlist refresh timers.
    pub refresh_interval_secs: u64,

    /// Quiet time after the last keystroke before a search is issued.
    pub search_debounce_ms: u64,

    /// Queries shorter than this (in characters) never reach the backend.
    pub min_search_len: usize,

    /// TTL for the optional GET response cache. `None` disables it.
    pub cache_ttl_secs: Option<u64>,

    /// Section marked active at startup.
    pub default_section: Section,

    /// Holdings valued on every portfolio refresh.
    pub holdings: Vec<Holding>,

    /// Initial watchlist.
    pub watchlist: Vec<String>,

    /// How many holdings get a mini chart on the overview.
    pub overview_holdings: usize,

    /// How many trending stocks get a mini chart on the overview.
    pub overview_trending: usize,

    pub mini_chart_period: Period,
    pub detail_chart_period: Period,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            request_timeout_secs: 30,
            refresh_interval_secs: 30,
            search_debounce_ms: 300,
            min_search_len: MIN_SEARCH_LEN,
            cache_ttl_secs: None,
            default_section: Section::Overview,
            holdings: default_holdings(),
            watchlist: ["RELIANCE", "TCS", "HDFCBANK", "INFY", "ICICIBANK", "WIPRO"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            overview_holdings: 4,
            overview_trending: 6,
            mini_chart_period: Period::FiveDays,
            detail_chart_period: Period::OneMonth,
        }
    }
}

fn default_holdings() -> Vec<Holding> {
    [
        ("RELIANCE", 10, 2540.0),
        ("TCS", 5, 3620.0),
        ("HDFCBANK", 15, 1580.0),
        ("INFY", 20, 1450.0),
    ]
    .iter()
    .map(|&(symbol, quantity, avg_price)| Holding {
        symbol: symbol.to_string(),
        quantity,
        avg_price,
    })
    .collect()
}

impl DashboardSettings {
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let settings: DashboardSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Apply `STOCK_DASHBOARD_API_URL` if it is set and non-empty.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_base_url = url.trim().to_string();
            }
        }
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.api_base_url.trim().is_empty() {
            return Err(CoreError::Config("api_base_url must not be empty".into()));
        }
        if self.refresh_interval_secs == 0 {
            return Err(CoreError::Config("refresh_interval_secs must be positive".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(CoreError::Config("request_timeout_secs must be positive".into()));
        }
        if self.search_debounce_ms == 0 {
            return Err(CoreError::Config("search_debounce_ms must be positive".into()));
        }
        if self.min_search_len < MIN_SEARCH_LEN {
            return Err(CoreError::Config(format!(
                "min_search_len must be at least {MIN_SEARCH_LEN}"
            )));
        }
        for h in &self.holdings {
            Holding::new(h.symbol.clone(), h.quantity, h.avg_price)
                .map_err(|e| CoreError::Config(e.to_string()))?;
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }
}
