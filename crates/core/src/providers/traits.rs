use async_trait::async_trait;
use futures::future::join_all;
use log::warn;

use crate::errors::CoreError;
use crate::models::chart::ChartSeries;
use crate::models::market::{
    FundsResponse, HealthStatus, IndicesResponse, SearchResponse, StockHistory, StockListing,
    StockQuote, TrendingResponse,
};
use crate::models::period::Period;
use crate::models::portfolio::{Holding, PortfolioSnapshot};

/// Contract of the dashboard backend, one operation per capability.
///
/// Implementations surface every failure to the caller as
/// `CoreError::RequestFailed`. Nothing is retried; callers decide.
#[async_trait]
pub trait MarketApi: Send + Sync {
    /// Human-readable name of this backend (for logs/errors).
    fn name(&self) -> &str;

    async fn get_stock(&self, symbol: &str) -> Result<StockQuote, CoreError>;

    async fn get_trending_stocks(&self) -> Result<TrendingResponse, CoreError>;

    async fn get_market_indices(&self) -> Result<IndicesResponse, CoreError>;

    async fn get_stock_history(
        &self,
        symbol: &str,
        period: Period,
    ) -> Result<StockHistory, CoreError>;

    async fn get_chart_data(&self, symbol: &str, period: Period)
        -> Result<ChartSeries, CoreError>;

    /// Value `holdings` at live prices. The list must be non-empty.
    async fn calculate_portfolio(
        &self,
        holdings: &[Holding],
    ) -> Result<PortfolioSnapshot, CoreError>;

    async fn search_stocks(&self, query: &str) -> Result<SearchResponse, CoreError>;

    async fn get_mutual_funds(&self) -> Result<FundsResponse, CoreError>;

    async fn list_stocks(&self, limit: usize, offset: usize) -> Result<StockListing, CoreError>;

    async fn health_check(&self) -> Result<HealthStatus, CoreError>;

    /// Fetch every symbol concurrently and keep the ones that succeeded,
    /// in input order. Failed entries are logged and dropped.
    async fn get_batch_stocks(&self, symbols: &[String]) -> Vec<StockQuote> {
        let results = join_all(symbols.iter().map(|s| self.get_stock(s))).await;
        results
            .into_iter()
            .zip(symbols)
            .filter_map(|(result, symbol)| match result {
                Ok(quote) => Some(quote),
                Err(e) => {
                    warn!("Batch fetch dropped {symbol}: {e}");
                    None
                }
            })
            .collect()
    }
}

/// Reject empty symbols before any request is issued.
pub fn validate_symbol(symbol: &str) -> Result<&str, CoreError> {
    let trimmed = symbol.trim();
    if trimmed.is_empty() {
        return Err(CoreError::ValidationError("Symbol must not be empty".into()));
    }
    Ok(trimmed)
}

pub fn validate_holdings(holdings: &[Holding]) -> Result<(), CoreError> {
    if holdings.is_empty() {
        return Err(CoreError::ValidationError(
            "Portfolio valuation needs at least one holding".into(),
        ));
    }
    Ok(())
}
