use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use log::debug;

use crate::cancellation::CancelToken;
use crate::errors::CoreError;
use crate::models::chart::{ChartMode, ChartSeries, ChartSpec};
use crate::models::period::Period;
use crate::providers::traits::MarketApi;

/// Opaque id of one live chart instance, issued by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChartHandle(pub u64);

/// The charting library, treated as a black box.
pub trait ChartBackend: Send + Sync {
    /// Whether a drawing surface named `target` currently exists.
    fn has_target(&self, target: &str) -> bool;

    /// Draw a new chart instance on `target`.
    fn create(&self, target: &str, spec: &ChartSpec) -> Result<ChartHandle, CoreError>;

    /// Release a chart instance and its rendering resources.
    fn destroy(&self, handle: ChartHandle);
}

/// Binds each chart target to at most one live chart instance.
///
/// Any instance already bound to a target is destroyed before a new one is
/// created for it.
pub struct ChartRegistry {
    backend: Arc<dyn ChartBackend>,
    live: HashMap<String, ChartHandle>,
}

pub type SharedChartRegistry = Arc<Mutex<ChartRegistry>>;

impl ChartRegistry {
    pub fn new(backend: Arc<dyn ChartBackend>) -> Self {
        Self {
            backend,
            live: HashMap::new(),
        }
    }

    pub fn shared(backend: Arc<dyn ChartBackend>) -> SharedChartRegistry {
        Arc::new(Mutex::new(Self::new(backend)))
    }

    /// Create-or-replace the chart on `target`.
    ///
    /// The previous instance is destroyed even when the target has since
    /// disappeared; in that case `RenderTargetMissing` is returned.
    pub fn render(&mut self, target: &str, spec: &ChartSpec) -> Result<ChartHandle, CoreError> {
        if let Some(old) = self.live.remove(target) {
            debug!("Destroying chart {old:?} on {target}");
            self.backend.destroy(old);
        }
        if !self.backend.has_target(target) {
            return Err(CoreError::RenderTargetMissing(target.to_string()));
        }
        let handle = self.backend.create(target, spec)?;
        self.live.insert(target.to_string(), handle);
        Ok(handle)
    }

    /// Destroy the chart on `target`, if any. Returns whether one existed.
    pub fn destroy(&mut self, target: &str) -> bool {
        match self.live.remove(target) {
            Some(handle) => {
                self.backend.destroy(handle);
                true
            }
            None => false,
        }
    }

    pub fn destroy_all(&mut self) {
        for (_, handle) in self.live.drain() {
            self.backend.destroy(handle);
        }
    }

    pub fn live_handle(&self, target: &str) -> Option<ChartHandle> {
        self.live.get(target).copied()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

pub(crate) fn lock_registry(charts: &SharedChartRegistry) -> MutexGuard<'_, ChartRegistry> {
    charts.lock().unwrap_or_else(|e| e.into_inner())
}

/// A chart bound to one target: fetches a series and renders it.
///
/// Remembers the last loaded symbol so the period can be changed in place.
pub struct StockChart {
    target: String,
    mode: ChartMode,
    api: Arc<dyn MarketApi>,
    charts: SharedChartRegistry,
    current_symbol: Option<String>,
    current_period: Period,
}

impl StockChart {
    pub fn new(
        target: impl Into<String>,
        mode: ChartMode,
        api: Arc<dyn MarketApi>,
        charts: SharedChartRegistry,
    ) -> Self {
        Self {
            target: target.into(),
            mode,
            api,
            charts,
            current_symbol: None,
            current_period: Period::default(),
        }
    }

    pub fn full(
        target: impl Into<String>,
        api: Arc<dyn MarketApi>,
        charts: SharedChartRegistry,
    ) -> Self {
        Self::new(target, ChartMode::Full, api, charts)
    }

    /// Sparkline variant: no axes, legend or tooltip.
    pub fn mini(
        target: impl Into<String>,
        api: Arc<dyn MarketApi>,
        charts: SharedChartRegistry,
    ) -> Self {
        Self::new(target, ChartMode::Mini, api, charts)
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn current_symbol(&self) -> Option<&str> {
        self.current_symbol.as_deref()
    }

    pub fn current_period(&self) -> Period {
        self.current_period
    }

    /// Fetch the series for `(symbol, period)` and render it.
    pub async fn load_chart(
        &mut self,
        symbol: &str,
        period: Period,
    ) -> Result<ChartHandle, CoreError> {
        self.load_chart_until(symbol, period, &CancelToken::new())
            .await
    }

    /// Like [`load_chart`](Self::load_chart), but a result that arrives after
    /// `token` was cancelled is discarded with `CoreError::Cancelled`.
    pub async fn load_chart_until(
        &mut self,
        symbol: &str,
        period: Period,
        token: &CancelToken,
    ) -> Result<ChartHandle, CoreError> {
        let series = self.api.get_chart_data(symbol, period).await?;
        if token.is_cancelled() {
            debug!("Discarding chart data for {symbol} on {}: cancelled", self.target);
            return Err(CoreError::Cancelled);
        }
        self.current_symbol = Some(symbol.trim().to_uppercase());
        self.current_period = period;
        self.render(&series)
    }

    /// Re-fetch the current symbol at `period` and replace the chart.
    /// Does nothing if no chart was loaded yet.
    pub async fn change_period(&mut self, period: Period) -> Result<Option<ChartHandle>, CoreError> {
        self.change_period_until(period, &CancelToken::new()).await
    }

    pub async fn change_period_until(
        &mut self,
        period: Period,
        token: &CancelToken,
    ) -> Result<Option<ChartHandle>, CoreError> {
        match self.current_symbol.clone() {
            Some(symbol) => self
                .load_chart_until(&symbol, period, token)
                .await
                .map(Some),
            None => Ok(None),
        }
    }

    pub fn render(&self, series: &ChartSeries) -> Result<ChartHandle, CoreError> {
        let spec = ChartSpec::from_series(series, self.mode);
        lock_registry(&self.charts).render(&self.target, &spec)
    }

    /// Release the chart instance. Safe to call when none exists.
    pub fn destroy(&mut self) {
        lock_registry(&self.charts).destroy(&self.target);
    }
}
