pub mod cancellation;
pub mod errors;
pub mod format;
pub mod models;
pub mod providers;
pub mod services;
pub mod view;

use std::sync::Arc;

pub use cancellation::CancelToken;
pub use errors::{CoreError, RequestFailure};
pub use models::period::Period;
pub use models::section::Section;
pub use models::settings::DashboardSettings;
pub use providers::traits::MarketApi;
pub use services::chart_service::{ChartBackend, ChartHandle, ChartRegistry, StockChart};
pub use services::dashboard_service::{DashboardCoordinator, LoadOutcome, RefreshKind};
pub use view::{DashboardView, Region, ViewUpdate};

use models::session::SessionState;
use providers::http::HttpMarketApi;

/// Build a coordinator that talks to the HTTP backend named in `settings`.
///
/// The host supplies the rendering surface, the chart library and the
/// session; the core owns everything in between.
pub fn connect(
    settings: DashboardSettings,
    view: Arc<dyn DashboardView>,
    chart_backend: Arc<dyn ChartBackend>,
    session: Arc<dyn SessionState>,
) -> Result<DashboardCoordinator, CoreError> {
    let api: Arc<dyn MarketApi> = Arc::new(HttpMarketApi::new(&settings)?);
    DashboardCoordinator::new(settings, api, view, chart_backend, session)
}
