use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::CoreError;
use crate::models::chart::ChartSeries;
use crate::models::market::{
    FundsResponse, HealthStatus, IndicesResponse, SearchResponse, StockHistory, StockListing,
    StockQuote, TrendingResponse,
};
use crate::models::period::Period;
use crate::models::portfolio::{Holding, PortfolioSnapshot, ValuationRequest};
use crate::models::settings::DashboardSettings;
use super::cache::ResponseCache;
use super::traits::{validate_holdings, validate_symbol, MarketApi};

/// Dashboard backend reached over HTTP with JSON bodies.
///
/// - **Endpoints**: `/stock/{symbol}`, `/stocks/trending`, `/indices`,
///   `/stock/history/{symbol}`, `/stock/chart/{symbol}`,
///   `/portfolio/calculate` (POST), `/search`, `/mutual-funds`,
///   `/stocks/all`, `/health`.
/// - Any non-2xx status is a failure; the body of an error response is ignored.
/// - No retries. A timeout counts as a transport failure.
pub struct HttpMarketApi {
    client: Client,
    base_url: Url,
    cache: Option<ResponseCache>,
}

impl HttpMarketApi {
    pub fn new(settings: &DashboardSettings) -> Result<Self, CoreError> {
        let base_url = Url::parse(settings.api_base_url.trim_end_matches('/')).map_err(|e| {
            CoreError::Config(format!("Invalid API base URL {}: {e}", settings.api_base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CoreError::Config(format!(
                "API base URL {} cannot carry a path",
                settings.api_base_url
            )));
        }

        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| CoreError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            cache: settings.cache_ttl().map(ResponseCache::new),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Drop every cached response.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// Append percent-encoded path segments to the base URL.
    pub fn endpoint_url(&self, segments: &[&str]) -> Result<Url, CoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CoreError::Config(format!("API base URL {} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn endpoint_label(segments: &[&str]) -> String {
        format!("/{}", segments.join("/"))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
        cacheable: bool,
    ) -> Result<T, CoreError> {
        let endpoint = Self::endpoint_label(segments);
        let mut url = self.endpoint_url(segments)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }

        let cache = self.cache.as_ref().filter(|_| cacheable);
        if let Some(hit) = cache.and_then(|c| c.get(url.as_str())) {
            debug!("Cache hit for {endpoint}");
            return Self::decode_value(&endpoint, hit);
        }

        debug!("GET {endpoint}");
        let resp = self.client.get(url.clone()).send().await.map_err(|e| {
            error!("API error ({endpoint}): {e}");
            CoreError::transport(&endpoint, e.to_string())
        })?;
        let value = Self::read_json(&endpoint, resp).await?;

        if let Some(cache) = cache {
            cache.insert(url.to_string(), value.clone());
        }
        Self::decode_value(&endpoint, value)
    }

    async fn post_json<B: serde::Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, CoreError> {
        let endpoint = Self::endpoint_label(segments);
        let url = self.endpoint_url(segments)?;

        debug!("POST {endpoint}");
        let resp = self.client.post(url).json(body).send().await.map_err(|e| {
            error!("API error ({endpoint}): {e}");
            CoreError::transport(&endpoint, e.to_string())
        })?;
        let value = Self::read_json(&endpoint, resp).await?;
        Self::decode_value(&endpoint, value)
    }

    async fn read_json(endpoint: &str, resp: Response) -> Result<Value, CoreError> {
        let status = resp.status();
        if !status.is_success() {
            error!("API error ({endpoint}): HTTP status {}", status.as_u16());
            return Err(CoreError::http_status(endpoint, status.as_u16()));
        }
        resp.json::<Value>().await.map_err(|e| {
            if e.is_decode() {
                CoreError::decode(endpoint, e.to_string())
            } else {
                CoreError::transport(endpoint, e.to_string())
            }
        })
    }

    fn decode_value<T: DeserializeOwned>(endpoint: &str, value: Value) -> Result<T, CoreError> {
        serde_json::from_value(value).map_err(|e| CoreError::decode(endpoint, e.to_string()))
    }
}

#[async_trait]
impl MarketApi for HttpMarketApi {
    fn name(&self) -> &str {
        "Dashboard API"
    }

    async fn get_stock(&self, symbol: &str) -> Result<StockQuote, CoreError> {
        let symbol = validate_symbol(symbol)?;
        self.get_json(&["stock", symbol], &[], true).await
    }

    async fn get_trending_stocks(&self) -> Result<TrendingResponse, CoreError> {
        self.get_json(&["stocks", "trending"], &[], true).await
    }

    async fn get_market_indices(&self) -> Result<IndicesResponse, CoreError> {
        self.get_json(&["indices"], &[], true).await
    }

    async fn get_stock_history(
        &self,
        symbol: &str,
        period: Period,
    ) -> Result<StockHistory, CoreError> {
        let symbol = validate_symbol(symbol)?;
        self.get_json(
            &["stock", "history", symbol],
            &[("period", period.to_string()), ("interval", "1d".to_string())],
            true,
        )
        .await
    }

    async fn get_chart_data(
        &self,
        symbol: &str,
        period: Period,
    ) -> Result<ChartSeries, CoreError> {
        let symbol = validate_symbol(symbol)?;
        self.get_json(
            &["stock", "chart", symbol],
            &[("period", period.to_string())],
            true,
        )
        .await
    }

    async fn calculate_portfolio(
        &self,
        holdings: &[Holding],
    ) -> Result<PortfolioSnapshot, CoreError> {
        validate_holdings(holdings)?;
        self.post_json(&["portfolio", "calculate"], &ValuationRequest { holdings })
            .await
    }

    async fn search_stocks(&self, query: &str) -> Result<SearchResponse, CoreError> {
        self.get_json(&["search"], &[("q", query.to_string())], true)
            .await
    }

    async fn get_mutual_funds(&self) -> Result<FundsResponse, CoreError> {
        self.get_json(&["mutual-funds"], &[], true).await
    }

    async fn list_stocks(&self, limit: usize, offset: usize) -> Result<StockListing, CoreError> {
        self.get_json(
            &["stocks", "all"],
            &[("limit", limit.to_string()), ("offset", offset.to_string())],
            true,
        )
        .await
    }

    async fn health_check(&self) -> Result<HealthStatus, CoreError> {
        self.get_json(&["health"], &[], false).await
    }
}
