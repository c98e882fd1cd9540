// ═══════════════════════════════════════════════════════════════════
// Shared test doubles: mock backend, chart library, view, session
// ═══════════════════════════════════════════════════════════════════
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stock_dashboard_core::errors::CoreError;
use stock_dashboard_core::models::chart::{ChartDatasets, ChartSeries, ChartSpec};
use stock_dashboard_core::models::market::{
    FundsResponse, HealthStatus, IndicesResponse, MarketIndex, MutualFund, SearchResponse,
    SearchResult, StockHistory, StockListing, StockQuote, TrendingResponse, TrendingStock,
};
use stock_dashboard_core::models::period::Period;
use stock_dashboard_core::models::portfolio::{Holding, PortfolioSnapshot};
use stock_dashboard_core::models::session::StaticSession;
use stock_dashboard_core::models::settings::DashboardSettings;
use stock_dashboard_core::providers::traits::MarketApi;
use stock_dashboard_core::services::chart_service::{ChartBackend, ChartHandle};
use stock_dashboard_core::services::dashboard_service::DashboardCoordinator;
use stock_dashboard_core::services::portfolio_service::PortfolioService;
use stock_dashboard_core::view::{DashboardView, Region, ViewUpdate};

// ── Mock backend ────────────────────────────────────────────────────

/// In-memory backend. Every call is recorded as `"<op>:<arg>"`.
pub struct MockApi {
    pub prices: HashMap<String, f64>,
    /// Symbols whose quote and chart requests fail with HTTP 404.
    pub failing_symbols: HashSet<String>,
    /// Operations that fail with HTTP 500 (`indices`, `trending`, `funds`, ...).
    pub failing_ops: HashSet<&'static str>,
    pub healthy: bool,
    pub chart_points: usize,
    /// Artificial latency for quote and search requests.
    pub delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl MockApi {
    pub fn new() -> Self {
        let prices = [
            ("RELIANCE", 2600.0),
            ("TCS", 3700.0),
            ("HDFCBANK", 1550.0),
            ("INFY", 1500.0),
            ("ICICIBANK", 1000.0),
            ("WIPRO", 450.0),
            ("SBIN", 600.0),
        ]
        .iter()
        .map(|(s, p)| (s.to_string(), *p))
        .collect();
        Self {
            prices,
            failing_symbols: HashSet::new(),
            failing_ops: HashSet::new(),
            healthy: true,
            chart_points: 5,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    pub fn failing_symbol(mut self, symbol: &str) -> Self {
        self.failing_symbols.insert(symbol.to_string());
        self
    }

    pub fn failing_op(mut self, op: &'static str) -> Self {
        self.failing_ops.insert(op);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_chart_points(mut self, n: usize) -> Self {
        self.chart_points = n;
        self
    }

    fn record(&self, op: &str, arg: &str) {
        self.calls.lock().unwrap().push(format!("{op}:{arg}"));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls of `op`.
    pub fn count(&self, op: &str) -> usize {
        let prefix = format!("{op}:");
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(&prefix))
            .count()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn fail_if(&self, op: &'static str) -> Result<(), CoreError> {
        if self.failing_ops.contains(op) {
            return Err(CoreError::http_status(format!("/{op}"), 500));
        }
        Ok(())
    }

    fn quote(&self, symbol: &str) -> Result<StockQuote, CoreError> {
        let upper = symbol.to_uppercase();
        if self.failing_symbols.contains(&upper) {
            return Err(CoreError::http_status(format!("/stock/{upper}"), 404));
        }
        let price = *self
            .prices
            .get(&upper)
            .ok_or_else(|| CoreError::http_status(format!("/stock/{upper}"), 404))?;
        Ok(StockQuote {
            symbol: upper.clone(),
            name: format!("{upper} Ltd"),
            current_price: price,
            previous_close: price - 10.0,
            change: 10.0,
            change_percent: 10.0 / (price - 10.0) * 100.0,
            volume: 1_000,
            market_cap: price * 1_000_000.0,
            day_high: price + 5.0,
            day_low: price - 15.0,
            open: price - 8.0,
            week_52_high: price * 1.2,
            week_52_low: price * 0.8,
            pe_ratio: 25.0,
        })
    }

    pub fn series(&self, symbol: &str, period: Period) -> ChartSeries {
        let upper = symbol.to_uppercase();
        let base = self.prices.get(&upper).copied().unwrap_or(100.0);
        let n = self.chart_points;
        ChartSeries {
            symbol: upper,
            labels: (0..n).map(|i| format!("2025-01-{:02}", i + 1)).collect(),
            datasets: ChartDatasets {
                price: (0..n).map(|i| base + i as f64).collect(),
                volume: vec![100; n],
                ma20: Vec::new(),
                ma50: Vec::new(),
            },
            current_price: base + n.saturating_sub(1) as f64,
            period,
        }
    }
}

#[async_trait]
impl MarketApi for MockApi {
    fn name(&self) -> &str {
        "MockApi"
    }

    async fn get_stock(&self, symbol: &str) -> Result<StockQuote, CoreError> {
        self.record("stock", symbol);
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        self.quote(symbol)
    }

    async fn get_trending_stocks(&self) -> Result<TrendingResponse, CoreError> {
        self.record("trending", "");
        self.fail_if("trending")?;
        let mut symbols: Vec<&String> = self.prices.keys().collect();
        symbols.sort();
        Ok(TrendingResponse {
            stocks: symbols
                .into_iter()
                .map(|s| TrendingStock {
                    symbol: s.clone(),
                    name: format!("{s} Ltd"),
                    price: self.prices[s],
                    change: 1.0,
                    change_percent: 0.5,
                    volume: 10,
                })
                .collect(),
        })
    }

    async fn get_market_indices(&self) -> Result<IndicesResponse, CoreError> {
        self.record("indices", "");
        self.fail_if("indices")?;
        Ok(IndicesResponse {
            indices: vec![
                MarketIndex {
                    name: "NIFTY 50".into(),
                    value: 22000.0,
                    change: 120.0,
                    change_percent: 0.55,
                },
                MarketIndex {
                    name: "SENSEX".into(),
                    value: 72500.0,
                    change: -80.0,
                    change_percent: -0.11,
                },
            ],
        })
    }

    async fn get_stock_history(
        &self,
        symbol: &str,
        period: Period,
    ) -> Result<StockHistory, CoreError> {
        self.record("history", symbol);
        self.fail_if("history")?;
        Ok(StockHistory {
            symbol: symbol.to_uppercase(),
            name: String::new(),
            period,
            interval: "1d".into(),
            history: Vec::new(),
            analytics: Default::default(),
        })
    }

    async fn get_chart_data(
        &self,
        symbol: &str,
        period: Period,
    ) -> Result<ChartSeries, CoreError> {
        self.record("chart", &format!("{symbol}@{period}"));
        if self.failing_symbols.contains(&symbol.to_uppercase()) {
            return Err(CoreError::http_status(format!("/stock/chart/{symbol}"), 404));
        }
        Ok(self.series(symbol, period))
    }

    async fn calculate_portfolio(
        &self,
        holdings: &[Holding],
    ) -> Result<PortfolioSnapshot, CoreError> {
        self.record("portfolio", &holdings.len().to_string());
        self.fail_if("portfolio")?;
        Ok(PortfolioService::new().compute_snapshot(holdings, &self.prices))
    }

    async fn search_stocks(&self, query: &str) -> Result<SearchResponse, CoreError> {
        self.record("search", query);
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        self.fail_if("search")?;
        let upper = query.to_uppercase();
        let results: Vec<SearchResult> = self
            .prices
            .keys()
            .filter(|s| s.contains(&upper))
            .map(|s| SearchResult {
                symbol: s.clone(),
                name: format!("{s} Ltd"),
                exchange: Some("NSE".into()),
                sector: None,
                industry: None,
                price: None,
                change_percent: None,
            })
            .collect();
        let total = results.len();
        Ok(SearchResponse { results, total })
    }

    async fn get_mutual_funds(&self) -> Result<FundsResponse, CoreError> {
        self.record("funds", "");
        self.fail_if("funds")?;
        Ok(FundsResponse {
            funds: vec![MutualFund {
                name: "Nifty BeES".into(),
                fund_type: "Equity ETF".into(),
                current_nav: 250.0,
                one_year_return: 12.5,
                three_year_return: 40.1,
            }],
        })
    }

    async fn list_stocks(&self, limit: usize, offset: usize) -> Result<StockListing, CoreError> {
        self.record("list", &format!("{limit}/{offset}"));
        let mut all: Vec<String> = self.prices.keys().cloned().collect();
        all.sort();
        let total = all.len();
        Ok(StockListing {
            stocks: all.into_iter().skip(offset).take(limit).collect(),
            total,
            limit,
            offset,
        })
    }

    async fn health_check(&self) -> Result<HealthStatus, CoreError> {
        self.record("health", "");
        if self.healthy {
            Ok(HealthStatus {
                status: "healthy".into(),
                message: "Stock Market API is running".into(),
            })
        } else {
            Err(CoreError::transport("/health", "connection refused"))
        }
    }
}

// ── Mock chart library ──────────────────────────────────────────────

/// Records every chart instance it creates and destroys.
#[derive(Default)]
pub struct MockChartBackend {
    next_id: AtomicU64,
    live: Mutex<HashMap<u64, String>>,
    created: Mutex<Vec<(String, ChartSpec)>>,
    destroyed: Mutex<Vec<u64>>,
    missing_targets: Mutex<HashSet<String>>,
}

impl MockChartBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remove_target(&self, target: &str) {
        self.missing_targets.lock().unwrap().insert(target.to_string());
    }

    /// Live (created and not yet destroyed) instances bound to `target`.
    pub fn live_on(&self, target: &str) -> usize {
        self.live
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.as_str() == target)
            .count()
    }

    pub fn live_total(&self) -> usize {
        self.live.lock().unwrap().len()
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn destroyed_count(&self) -> usize {
        self.destroyed.lock().unwrap().len()
    }

    pub fn last_spec(&self, target: &str) -> Option<ChartSpec> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(t, _)| t == target)
            .map(|(_, s)| s.clone())
    }
}

impl ChartBackend for MockChartBackend {
    fn has_target(&self, target: &str) -> bool {
        !self.missing_targets.lock().unwrap().contains(target)
    }

    fn create(&self, target: &str, spec: &ChartSpec) -> Result<ChartHandle, CoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.live.lock().unwrap().insert(id, target.to_string());
        self.created
            .lock()
            .unwrap()
            .push((target.to_string(), spec.clone()));
        Ok(ChartHandle(id))
    }

    fn destroy(&self, handle: ChartHandle) {
        self.live.lock().unwrap().remove(&handle.0);
        self.destroyed.lock().unwrap().push(handle.0);
    }
}

// ── Recording view ──────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingView {
    updates: Mutex<Vec<ViewUpdate>>,
    missing: Mutex<HashSet<Region>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remove_region(&self, region: Region) {
        self.missing.lock().unwrap().insert(region);
    }

    pub fn updates(&self) -> Vec<ViewUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&ViewUpdate) -> bool) -> usize {
        self.updates.lock().unwrap().iter().filter(|u| pred(u)).count()
    }

    pub fn last(&self, pred: impl Fn(&ViewUpdate) -> bool) -> Option<ViewUpdate> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|u| pred(u))
            .cloned()
    }

    pub fn clear(&self) {
        self.updates.lock().unwrap().clear();
    }
}

impl DashboardView for RecordingView {
    fn has_region(&self, region: Region) -> bool {
        !self.missing.lock().unwrap().contains(&region)
    }

    fn apply(&self, update: ViewUpdate) {
        self.updates.lock().unwrap().push(update);
    }
}

// ── Harness ─────────────────────────────────────────────────────────

pub struct Harness {
    pub api: Arc<MockApi>,
    pub charts: Arc<MockChartBackend>,
    pub view: Arc<RecordingView>,
    pub dashboard: DashboardCoordinator,
}

pub fn harness(api: MockApi) -> Harness {
    harness_with(api, DashboardSettings::default(), StaticSession::authenticated("ravi@example.com"))
}

pub fn harness_with(api: MockApi, settings: DashboardSettings, session: StaticSession) -> Harness {
    let api = Arc::new(api);
    let charts = Arc::new(MockChartBackend::new());
    let view = Arc::new(RecordingView::new());
    let dashboard = DashboardCoordinator::new(
        settings,
        api.clone(),
        view.clone(),
        charts.clone(),
        Arc::new(session),
    )
    .expect("valid settings");
    Harness {
        api,
        charts,
        view,
        dashboard,
    }
}
