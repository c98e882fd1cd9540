use crate::models::market::{MarketIndex, MutualFund, SearchResult, StockQuote, TrendingStock};
use crate::models::portfolio::{HoldingValuation, PortfolioSnapshot};
use crate::models::section::Section;

/// A UI region that fetched data is written into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Summary cards, holdings grid and holdings table.
    Portfolio,
    MarketIndices,
    TrendingStocks,
    Watchlist,
    MutualFunds,
    HoldingsOverview,
    IndicesOverview,
    TrendingOverview,
    SearchResults,
    StockDetail,
    PageTitle,
    MarketStatus,
    Advisory,
    Notice,
}

/// One change to the visible dashboard.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewUpdate {
    Portfolio(PortfolioSnapshot),
    MarketIndices(Vec<MarketIndex>),
    TrendingStocks(Vec<TrendingStock>),
    Watchlist(Vec<StockQuote>),
    MutualFunds(Vec<MutualFund>),
    HoldingsOverview(Vec<HoldingValuation>),
    IndicesOverview(Vec<MarketIndex>),
    TrendingOverview(Vec<TrendingStock>),
    SearchLoading,
    SearchResults(Vec<SearchResult>),
    SearchNoResults,
    SearchFailed,
    SearchHidden,
    StockDetail(StockQuote),
    SectionActivated { section: Section, title: String },
    MarketStatus { open: bool },
    /// Persistent advisory shown when the backend is unreachable.
    Degraded { message: String },
    /// A region's load failed; the view may show a partial-failure marker.
    RegionFailed(Region),
    Notice(String),
}

impl ViewUpdate {
    pub fn region(&self) -> Region {
        match self {
            ViewUpdate::Portfolio(_) => Region::Portfolio,
            ViewUpdate::MarketIndices(_) => Region::MarketIndices,
            ViewUpdate::TrendingStocks(_) => Region::TrendingStocks,
            ViewUpdate::Watchlist(_) => Region::Watchlist,
            ViewUpdate::MutualFunds(_) => Region::MutualFunds,
            ViewUpdate::HoldingsOverview(_) => Region::HoldingsOverview,
            ViewUpdate::IndicesOverview(_) => Region::IndicesOverview,
            ViewUpdate::TrendingOverview(_) => Region::TrendingOverview,
            ViewUpdate::SearchLoading
            | ViewUpdate::SearchResults(_)
            | ViewUpdate::SearchNoResults
            | ViewUpdate::SearchFailed
            | ViewUpdate::SearchHidden => Region::SearchResults,
            ViewUpdate::StockDetail(_) => Region::StockDetail,
            ViewUpdate::SectionActivated { .. } => Region::PageTitle,
            ViewUpdate::MarketStatus { .. } => Region::MarketStatus,
            ViewUpdate::Degraded { .. } => Region::Advisory,
            ViewUpdate::RegionFailed(region) => *region,
            ViewUpdate::Notice(_) => Region::Notice,
        }
    }
}

/// The rendering surface the coordinator writes into.
///
/// Implementations own templating; the core only decides what to show.
pub trait DashboardView: Send + Sync {
    /// Whether `region` currently exists. Updates for missing regions are
    /// discarded.
    fn has_region(&self, _region: Region) -> bool {
        true
    }

    fn apply(&self, update: ViewUpdate);
}

/// Apply `update` unless its scope was cancelled or its region is gone.
/// Returns whether the update reached the view.
pub(crate) fn apply_if_live(
    view: &dyn DashboardView,
    token: &crate::cancellation::CancelToken,
    update: ViewUpdate,
) -> bool {
    if token.is_cancelled() {
        log::debug!("Discarding {:?} update: scope cancelled", update.region());
        return false;
    }
    if !view.has_region(update.region()) {
        log::debug!("Discarding {:?} update: region not found", update.region());
        return false;
    }
    view.apply(update);
    true
}
