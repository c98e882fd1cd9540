use std::sync::{Arc, Mutex, MutexGuard, Weak};

use futures::future::join_all;
use log::{debug, error, info};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::cancellation::CancelToken;
use crate::errors::CoreError;
use crate::format::{format_currency, is_market_open};
use crate::models::chart::{ChartMode, ChartSeries, ChartSpec};
use crate::models::period::Period;
use crate::models::portfolio::{Holding, PortfolioSnapshot};
use crate::models::section::{Section, SectionVisibility};
use crate::models::session::SessionState;
use crate::models::settings::DashboardSettings;
use crate::models::watchlist::{WatchlistChange, WatchlistSet};
use crate::providers::traits::{validate_symbol, MarketApi};
use crate::services::chart_service::{
    lock_registry, ChartBackend, ChartRegistry, SharedChartRegistry, StockChart,
};
use crate::services::portfolio_service::PortfolioService;
use crate::services::search_service::SearchService;
use crate::view::{apply_if_live, DashboardView, Region, ViewUpdate};

pub const PORTFOLIO_CHART_TARGET: &str = "portfolio-overview-chart";
pub const DETAIL_CHART_TARGET: &str = "modal-stock-chart";

pub fn holding_chart_target(symbol: &str) -> String {
    format!("mini-chart-{symbol}")
}

pub fn trending_chart_target(symbol: &str) -> String {
    format!("trending-{symbol}")
}

const DEGRADED_MESSAGE: &str =
    "Backend server not running. Start the API server for live data.";

/// Result of the initial load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Ready,
    /// Health probe failed; nothing else was fetched.
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardState {
    Idle,
    Ready,
    Degraded,
    LoggedOut,
}

/// The two background refresh timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshKind {
    /// Portfolio valuation and indices.
    Portfolio,
    Watchlist,
}

impl RefreshKind {
    /// The section that must be active for a tick to fetch anything.
    pub fn owner(&self) -> Section {
        match self {
            RefreshKind::Portfolio => Section::Overview,
            RefreshKind::Watchlist => Section::Watchlist,
        }
    }
}

struct Inner {
    settings: DashboardSettings,
    api: Arc<dyn MarketApi>,
    view: Arc<dyn DashboardView>,
    session: Arc<dyn SessionState>,
    charts: SharedChartRegistry,
    portfolio_service: PortfolioService,
    search: SearchService,
    holdings: Vec<Holding>,
    watchlist: Mutex<WatchlistSet>,
    sections: Mutex<SectionVisibility>,
    state: Mutex<DashboardState>,
    /// Cancelled on logout; every other token descends from it.
    session_token: CancelToken,
    /// Token of the active section; replaced on every section change.
    section_token: Mutex<CancelToken>,
    detail_token: Mutex<CancelToken>,
    detail_chart: tokio::sync::Mutex<Option<StockChart>>,
    portfolio_period: Mutex<Period>,
    refresh_tasks: Mutex<Vec<JoinHandle<()>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Decides what to load and when, and applies results to the view.
///
/// Owns the watchlist, the active section, the chart registry and the
/// cancellation scopes. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct DashboardCoordinator {
    inner: Arc<Inner>,
}

impl DashboardCoordinator {
    pub fn new(
        settings: DashboardSettings,
        api: Arc<dyn MarketApi>,
        view: Arc<dyn DashboardView>,
        chart_backend: Arc<dyn ChartBackend>,
        session: Arc<dyn SessionState>,
    ) -> Result<Self, CoreError> {
        settings.validate()?;
        let holdings = settings
            .holdings
            .iter()
            .map(|h| Holding::new(h.symbol.clone(), h.quantity, h.avg_price))
            .collect::<Result<Vec<_>, _>>()?;

        let session_token = CancelToken::new();
        let search = SearchService::new(
            Arc::clone(&api),
            Arc::clone(&view),
            settings.search_debounce(),
            settings.min_search_len,
            session_token.clone(),
        );

        let inner = Inner {
            watchlist: Mutex::new(WatchlistSet::from_symbols(settings.watchlist.iter().cloned())),
            sections: Mutex::new(SectionVisibility::new(settings.default_section)),
            state: Mutex::new(DashboardState::Idle),
            section_token: Mutex::new(session_token.child()),
            detail_token: Mutex::new(session_token.child()),
            detail_chart: tokio::sync::Mutex::new(None),
            portfolio_period: Mutex::new(Period::OneMonth),
            refresh_tasks: Mutex::new(Vec::new()),
            charts: ChartRegistry::shared(chart_backend),
            portfolio_service: PortfolioService::new(),
            search,
            holdings,
            session_token,
            settings,
            api,
            view,
            session,
        };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn settings(&self) -> &DashboardSettings {
        &self.inner.settings
    }

    pub fn state(&self) -> DashboardState {
        *lock(&self.inner.state)
    }

    fn session_closed(&self) -> bool {
        self.state() == DashboardState::LoggedOut || self.inner.session_token.is_cancelled()
    }

    pub fn active_section(&self) -> Section {
        lock(&self.inner.sections).active()
    }

    pub fn is_active(&self, section: Section) -> bool {
        lock(&self.inner.sections).is_active(section)
    }

    pub fn section_visibility(&self) -> SectionVisibility {
        *lock(&self.inner.sections)
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.inner.holdings
    }

    pub fn watchlist(&self) -> Vec<String> {
        lock(&self.inner.watchlist).symbols().to_vec()
    }

    pub fn charts(&self) -> SharedChartRegistry {
        Arc::clone(&self.inner.charts)
    }

    pub fn search(&self) -> &SearchService {
        &self.inner.search
    }

    pub fn display_name(&self) -> String {
        self.inner.session.display_name()
    }

    fn section_token(&self) -> CancelToken {
        lock(&self.inner.section_token).clone()
    }

    fn show(&self, token: &CancelToken, update: ViewUpdate) -> bool {
        apply_if_live(self.inner.view.as_ref(), token, update)
    }

    /// Log a region failure and surface it to the view. Cancellation and
    /// missing render targets are expected races and only logged at debug.
    fn settle(&self, region: Region, token: &CancelToken, what: &str, result: Result<(), CoreError>) -> bool {
        match result {
            Ok(()) => {
                info!("{what} loaded");
                true
            }
            Err(e @ (CoreError::Cancelled | CoreError::RenderTargetMissing(_))) => {
                debug!("{what} discarded: {e}");
                false
            }
            Err(e) => {
                error!("Error loading {what}: {e}");
                self.show(token, ViewUpdate::RegionFailed(region));
                false
            }
        }
    }

    // ── Initial load ────────────────────────────────────────────────

    /// Probe the backend, fan out the independent region loads, then load
    /// the chart-dependent regions in order and start background refresh.
    pub async fn initialize(&self) -> Result<LoadOutcome, CoreError> {
        if !self.inner.session.is_authenticated() {
            return Err(CoreError::NotAuthenticated);
        }
        let token = self.inner.session_token.clone();
        let section = self.active_section();
        self.show(
            &token,
            ViewUpdate::SectionActivated {
                section,
                title: section.title().to_string(),
            },
        );

        if !self.check_backend_health().await {
            *lock(&self.inner.state) = DashboardState::Degraded;
            return Ok(LoadOutcome::Degraded);
        }

        tokio::join!(
            self.load_portfolio_data(&token),
            self.load_market_indices(&token),
            self.load_trending_stocks(&token),
            self.load_watchlist(&token),
            self.load_mutual_funds(&token),
        );

        let period = *lock(&self.inner.portfolio_period);
        self.load_portfolio_chart(period, &token).await;
        self.load_holdings_with_charts(&token).await;
        self.load_indices_overview(&token).await;
        self.load_trending_overview(&token).await;

        if token.is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        self.start_auto_refresh();
        *lock(&self.inner.state) = DashboardState::Ready;
        info!("All data loaded");
        Ok(LoadOutcome::Ready)
    }

    /// Health probe. On failure the view gets a persistent advisory.
    pub async fn check_backend_health(&self) -> bool {
        let token = self.inner.session_token.clone();
        match self.inner.api.health_check().await {
            Ok(health) if health.is_healthy() => {
                info!("Backend is healthy: {}", health.message);
                self.show(
                    &token,
                    ViewUpdate::MarketStatus {
                        open: is_market_open(chrono::Utc::now()),
                    },
                );
                true
            }
            Ok(health) => {
                error!("Backend reported status {}", health.status);
                self.show(&token, ViewUpdate::Degraded { message: DEGRADED_MESSAGE.into() });
                false
            }
            Err(e) => {
                error!("Backend is not responding: {e}");
                self.show(&token, ViewUpdate::Degraded { message: DEGRADED_MESSAGE.into() });
                false
            }
        }
    }

    // ── Region loads ────────────────────────────────────────────────

    async fn fetch_portfolio(&self) -> Result<PortfolioSnapshot, CoreError> {
        if self.inner.holdings.is_empty() {
            return Ok(PortfolioSnapshot::default());
        }
        self.inner.api.calculate_portfolio(&self.inner.holdings).await
    }

    pub async fn load_portfolio_data(&self, token: &CancelToken) -> bool {
        let result: Result<(), CoreError> = async {
            let snapshot = self.fetch_portfolio().await?;
            self.show(token, ViewUpdate::Portfolio(snapshot));
            Ok(())
        }
        .await;
        self.settle(Region::Portfolio, token, "Portfolio data", result)
    }

    pub async fn load_market_indices(&self, token: &CancelToken) -> bool {
        let result: Result<(), CoreError> = async {
            let data = self.inner.api.get_market_indices().await?;
            self.show(token, ViewUpdate::MarketIndices(data.indices));
            Ok(())
        }
        .await;
        self.settle(Region::MarketIndices, token, "Market indices", result)
    }

    pub async fn load_trending_stocks(&self, token: &CancelToken) -> bool {
        let result: Result<(), CoreError> = async {
            let data = self.inner.api.get_trending_stocks().await?;
            self.show(token, ViewUpdate::TrendingStocks(data.stocks));
            Ok(())
        }
        .await;
        self.settle(Region::TrendingStocks, token, "Trending stocks", result)
    }

    /// Batch-fetch every watched symbol. Individual failures are dropped by
    /// the batch, so this only fails when the scope is cancelled.
    pub async fn load_watchlist(&self, token: &CancelToken) -> bool {
        let symbols = self.watchlist();
        let stocks = self.inner.api.get_batch_stocks(&symbols).await;
        let shown = self.show(token, ViewUpdate::Watchlist(stocks));
        if shown {
            info!("Watchlist loaded");
        }
        shown
    }

    pub async fn load_mutual_funds(&self, token: &CancelToken) -> bool {
        let result: Result<(), CoreError> = async {
            let data = self.inner.api.get_mutual_funds().await?;
            self.show(token, ViewUpdate::MutualFunds(data.funds));
            Ok(())
        }
        .await;
        self.settle(Region::MutualFunds, token, "Mutual funds", result)
    }

    // ── Overview charts ─────────────────────────────────────────────

    /// Portfolio value chart: every holding's series fetched concurrently,
    /// summed as quantity × price per point.
    pub async fn load_portfolio_chart(&self, period: Period, token: &CancelToken) -> bool {
        let result: Result<(), CoreError> = async {
            let holdings = &self.inner.holdings;
            let fetched = join_all(
                holdings
                    .iter()
                    .map(|h| self.inner.api.get_chart_data(&h.symbol, period)),
            )
            .await;

            let mut series: Vec<ChartSeries> = Vec::new();
            let mut first_error = None;
            for result in fetched {
                match result {
                    Ok(s) => series.push(s),
                    Err(e) => {
                        debug!("Portfolio chart skipped a holding: {e}");
                        first_error.get_or_insert(e);
                    }
                }
            }
            if series.is_empty() {
                if let Some(e) = first_error {
                    return Err(e);
                }
            }
            if token.is_cancelled() {
                return Err(CoreError::Cancelled);
            }

            let (labels, values) = self.inner.portfolio_service.value_series(holdings, &series);
            let spec = ChartSpec::single("Portfolio Value", labels, values, ChartMode::Full);
            lock_registry(&self.inner.charts).render(PORTFOLIO_CHART_TARGET, &spec)?;
            Ok(())
        }
        .await;
        self.settle(Region::Portfolio, token, "Portfolio overview chart", result)
    }

    /// Re-render the portfolio chart for a period-selector label
    /// (`1D`, `1W`, `1M`, `3M`, `1Y`).
    pub async fn select_portfolio_period(&self, label: &str) -> Period {
        let period = Period::from_selector_label(label);
        *lock(&self.inner.portfolio_period) = period;
        let token = self.section_token();
        self.load_portfolio_chart(period, &token).await;
        period
    }

    /// Render one sparkline. Failures are logged only.
    async fn render_mini_chart(&self, symbol: &str, target: &str, token: &CancelToken) -> bool {
        let mut chart = StockChart::mini(
            target,
            Arc::clone(&self.inner.api),
            Arc::clone(&self.inner.charts),
        );
        match chart
            .load_chart_until(symbol, self.inner.settings.mini_chart_period, token)
            .await
        {
            Ok(_) => true,
            Err(e @ (CoreError::Cancelled | CoreError::RenderTargetMissing(_))) => {
                debug!("Mini chart for {symbol} discarded: {e}");
                false
            }
            Err(e) => {
                error!("Error rendering mini chart for {symbol}: {e}");
                false
            }
        }
    }

    /// Valuation first, then one mini chart per leading holding, in order.
    pub async fn load_holdings_with_charts(&self, token: &CancelToken) -> bool {
        let result: Result<(), CoreError> = async {
            let snapshot = self.fetch_portfolio().await?;
            let leading: Vec<_> = snapshot
                .holdings
                .into_iter()
                .take(self.inner.settings.overview_holdings)
                .collect();
            let symbols: Vec<String> = leading.iter().map(|h| h.symbol.clone()).collect();
            self.show(token, ViewUpdate::HoldingsOverview(leading));

            for symbol in &symbols {
                if token.is_cancelled() {
                    return Err(CoreError::Cancelled);
                }
                self.render_mini_chart(symbol, &holding_chart_target(symbol), token)
                    .await;
            }
            Ok(())
        }
        .await;
        self.settle(Region::HoldingsOverview, token, "Holdings with charts", result)
    }

    pub async fn load_indices_overview(&self, token: &CancelToken) -> bool {
        let result: Result<(), CoreError> = async {
            let data = self.inner.api.get_market_indices().await?;
            self.show(token, ViewUpdate::IndicesOverview(data.indices));
            Ok(())
        }
        .await;
        self.settle(Region::IndicesOverview, token, "Market indices overview", result)
    }

    pub async fn load_trending_overview(&self, token: &CancelToken) -> bool {
        let result: Result<(), CoreError> = async {
            let data = self.inner.api.get_trending_stocks().await?;
            let leading: Vec<_> = data
                .stocks
                .into_iter()
                .take(self.inner.settings.overview_trending)
                .collect();
            let symbols: Vec<String> = leading.iter().map(|s| s.symbol.clone()).collect();
            self.show(token, ViewUpdate::TrendingOverview(leading));

            for symbol in &symbols {
                if token.is_cancelled() {
                    return Err(CoreError::Cancelled);
                }
                self.render_mini_chart(symbol, &trending_chart_target(symbol), token)
                    .await;
            }
            Ok(())
        }
        .await;
        self.settle(Region::TrendingOverview, token, "Trending stocks overview", result)
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// Make `section` the only active section and return its token.
    /// Leaving a section cancels whatever it still had in flight.
    pub fn activate(&self, section: Section) -> CancelToken {
        let previous = lock(&self.inner.sections).activate(section);
        let token = {
            let mut current = lock(&self.inner.section_token);
            if previous != section {
                current.cancel();
                *current = self.inner.session_token.child();
            }
            current.clone()
        };
        self.show(
            &token,
            ViewUpdate::SectionActivated {
                section,
                title: section.title().to_string(),
            },
        );
        token
    }

    /// Switch sections and load only the new section's data.
    /// Does nothing once the session is closed.
    pub async fn navigate(&self, section: Section) {
        if self.session_closed() {
            debug!("Ignoring navigation to {section}: session closed");
            return;
        }
        let token = self.activate(section);
        self.load_section_data(section, &token).await;
    }

    pub async fn load_section_data(&self, section: Section, token: &CancelToken) {
        if self.session_closed() || token.is_cancelled() {
            return;
        }
        match section {
            Section::Overview => {
                tokio::join!(self.load_portfolio_data(token), self.load_market_indices(token));
            }
            Section::Portfolio => {
                self.load_portfolio_data(token).await;
            }
            Section::Stocks => {
                self.load_trending_stocks(token).await;
            }
            Section::Watchlist => {
                self.load_watchlist(token).await;
            }
            Section::MutualFunds => {
                self.load_mutual_funds(token).await;
            }
            Section::Orders | Section::Profile => {}
        }
    }

    // ── Background refresh ──────────────────────────────────────────

    /// One timer tick. Fetches nothing unless the owning section is active.
    /// Returns whether a refresh ran.
    pub async fn refresh(&self, kind: RefreshKind) -> bool {
        if self.session_closed() {
            return false;
        }
        if !self.is_active(kind.owner()) {
            debug!("Skipping {kind:?} refresh: {} is not active", kind.owner());
            return false;
        }
        let token = self.section_token();
        match kind {
            RefreshKind::Portfolio => {
                tokio::join!(self.load_portfolio_data(&token), self.load_market_indices(&token));
            }
            RefreshKind::Watchlist => {
                self.load_watchlist(&token).await;
            }
        }
        true
    }

    /// Spawn the portfolio and watchlist timers. Idempotent.
    ///
    /// Each tick spawns its refresh independently, so a slow fetch can
    /// overlap with the next tick's.
    pub fn start_auto_refresh(&self) {
        let mut tasks = lock(&self.inner.refresh_tasks);
        if !tasks.is_empty() {
            return;
        }
        let period = self.inner.settings.refresh_interval();
        for kind in [RefreshKind::Portfolio, RefreshKind::Watchlist] {
            let weak: Weak<Inner> = Arc::downgrade(&self.inner);
            tasks.push(tokio::spawn(async move {
                let mut timer = tokio::time::interval(period);
                timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // first tick completes immediately
                timer.tick().await;
                loop {
                    timer.tick().await;
                    let Some(inner) = weak.upgrade() else { break };
                    let coordinator = DashboardCoordinator { inner };
                    tokio::spawn(async move {
                        coordinator.refresh(kind).await;
                    });
                }
            }));
        }
        info!("Auto-refresh started");
    }

    pub fn is_auto_refresh_running(&self) -> bool {
        lock(&self.inner.refresh_tasks)
            .iter()
            .any(|t| !t.is_finished())
    }

    // ── Watchlist ───────────────────────────────────────────────────

    /// Add the symbol if absent, remove it otherwise, then reload the
    /// watchlist from the backend.
    pub async fn toggle_watchlist(&self, symbol: &str) -> Result<WatchlistChange, CoreError> {
        let symbol = validate_symbol(symbol)?.to_uppercase();
        let change = lock(&self.inner.watchlist).toggle(&symbol);
        let token = self.inner.session_token.clone();
        let notice = match change {
            WatchlistChange::Added => format!("{symbol} added to watchlist"),
            WatchlistChange::Removed => format!("{symbol} removed from watchlist"),
        };
        self.show(&token, ViewUpdate::Notice(notice));
        self.load_watchlist(&token).await;
        Ok(change)
    }

    /// Remove the symbol and reload. Returns false (and fetches nothing)
    /// if it was not watched.
    pub async fn remove_from_watchlist(&self, symbol: &str) -> bool {
        let removed = lock(&self.inner.watchlist).remove(symbol);
        if removed {
            let token = self.inner.session_token.clone();
            self.load_watchlist(&token).await;
        }
        removed
    }

    // ── Stock detail ────────────────────────────────────────────────

    fn open_detail_scope(&self) -> CancelToken {
        let mut current = lock(&self.inner.detail_token);
        current.cancel();
        *current = self.inner.session_token.child();
        current.clone()
    }

    /// Load the quote and the full chart for `symbol` into the detail view.
    pub async fn show_stock_detail(&self, symbol: &str) -> Result<(), CoreError> {
        let symbol = validate_symbol(symbol)?.to_uppercase();
        let token = self.open_detail_scope();

        let quote = self.inner.api.get_stock(&symbol).await.map_err(|e| {
            error!("Error loading stock detail for {symbol}: {e}");
            e
        })?;
        self.show(&token, ViewUpdate::StockDetail(quote));

        let mut detail = self.inner.detail_chart.lock().await;
        let chart = detail.get_or_insert_with(|| {
            StockChart::full(
                DETAIL_CHART_TARGET,
                Arc::clone(&self.inner.api),
                Arc::clone(&self.inner.charts),
            )
        });
        chart
            .load_chart_until(&symbol, self.inner.settings.detail_chart_period, &token)
            .await?;
        Ok(())
    }

    /// Re-render the detail chart at `period`. No-op when no detail is open.
    pub async fn change_detail_period(&self, period: Period) -> Result<bool, CoreError> {
        let token = lock(&self.inner.detail_token).clone();
        let mut detail = self.inner.detail_chart.lock().await;
        match detail.as_mut() {
            Some(chart) => Ok(chart.change_period_until(period, &token).await?.is_some()),
            None => Ok(false),
        }
    }

    /// Close the detail view and release its chart.
    pub async fn close_stock_detail(&self) {
        lock(&self.inner.detail_token).cancel();
        let mut detail = self.inner.detail_chart.lock().await;
        if let Some(mut chart) = detail.take() {
            chart.destroy();
        }
    }

    // ── User actions ────────────────────────────────────────────────

    /// Demo order: nothing is placed, the view gets a confirmation notice.
    pub fn buy_stock(&self, symbol: &str, price: f64) -> String {
        let notice = format!(
            "Buy order placed for {} at {}",
            symbol.trim().to_uppercase(),
            format_currency(price, true)
        );
        self.show(&self.inner.session_token, ViewUpdate::Notice(notice.clone()));
        notice
    }

    pub fn invest_in_fund(&self, fund_name: &str, nav: f64) -> String {
        let notice = format!(
            "Investment initiated in {fund_name}, NAV {}",
            format_currency(nav, true)
        );
        self.show(&self.inner.session_token, ViewUpdate::Notice(notice.clone()));
        notice
    }

    pub fn on_search_input(&self, text: &str) {
        self.inner.search.on_input(text);
    }

    /// Pick a hit from the results panel: close the panel, then open the
    /// detail view for `symbol`.
    pub async fn select_search_result(&self, symbol: &str) -> Result<(), CoreError> {
        self.inner.search.cancel_pending();
        self.inner.search.hide_results();
        self.show_stock_detail(symbol).await
    }

    // ── Teardown ────────────────────────────────────────────────────

    /// Cancel everything in flight, stop both timers and the pending search,
    /// and destroy every live chart.
    pub async fn logout(&self) {
        *lock(&self.inner.state) = DashboardState::LoggedOut;
        self.inner.session_token.cancel();
        for task in lock(&self.inner.refresh_tasks).drain(..) {
            task.abort();
        }
        self.inner.search.cancel_pending();
        self.close_stock_detail().await;
        lock_registry(&self.inner.charts).destroy_all();
        info!("Session closed");
    }
}
