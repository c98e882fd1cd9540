pub mod chart;
pub mod market;
pub mod period;
pub mod portfolio;
pub mod section;
pub mod session;
pub mod settings;
pub mod watchlist;
