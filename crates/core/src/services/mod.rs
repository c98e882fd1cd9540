pub mod chart_service;
pub mod dashboard_service;
pub mod portfolio_service;
pub mod search_service;
