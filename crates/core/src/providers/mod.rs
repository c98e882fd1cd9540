pub mod cache;
pub mod traits;

// Backend implementations
pub mod http;
