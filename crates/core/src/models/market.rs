use serde::{Deserialize, Serialize};

use super::period::Period;

/// Detailed quote for a single instrument (`GET /stock/{symbol}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockQuote {
    pub symbol: String,
    pub name: String,
    pub current_price: f64,
    #[serde(default)]
    pub previous_close: f64,
    #[serde(default)]
    pub change: f64,
    #[serde(default)]
    pub change_percent: f64,
    #[serde(default)]
    pub volume: u64,
    #[serde(default)]
    pub market_cap: f64,
    #[serde(default)]
    pub day_high: f64,
    #[serde(default)]
    pub day_low: f64,
    #[serde(default)]
    pub open: f64,
    #[serde(rename = "52_week_high", default)]
    pub week_52_high: f64,
    #[serde(rename = "52_week_low", default)]
    pub week_52_low: f64,
    #[serde(default)]
    pub pe_ratio: f64,
}

/// Entry of the trending set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingStock {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub change: f64,
    #[serde(default)]
    pub change_percent: f64,
    #[serde(default)]
    pub volume: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendingResponse {
    #[serde(default)]
    pub stocks: Vec<TrendingStock>,
}

/// A market index (NIFTY 50, SENSEX, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketIndex {
    pub name: String,
    pub value: f64,
    #[serde(default)]
    pub change: f64,
    #[serde(default)]
    pub change_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicesResponse {
    #[serde(default)]
    pub indices: Vec<MarketIndex>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutualFund {
    pub name: String,
    #[serde(rename = "type", default)]
    pub fund_type: String,
    pub current_nav: f64,
    #[serde(default)]
    pub one_year_return: f64,
    #[serde(default)]
    pub three_year_return: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundsResponse {
    #[serde(default)]
    pub funds: Vec<MutualFund>,
}

/// One hit of a free-text search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub change_percent: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// One OHLCV row of `GET /stock/history/{symbol}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryBar {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryAnalytics {
    pub high: f64,
    pub low: f64,
    pub avg: f64,
    #[serde(default)]
    pub total_volume: u64,
    #[serde(default)]
    pub data_points: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockHistory {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    pub period: Period,
    #[serde(default)]
    pub interval: String,
    #[serde(default)]
    pub history: Vec<HistoryBar>,
    #[serde(default)]
    pub analytics: HistoryAnalytics,
}

/// Page of `GET /stocks/all`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockListing {
    #[serde(default)]
    pub stocks: Vec<String>,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}
