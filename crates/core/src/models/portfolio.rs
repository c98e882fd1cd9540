use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// A user's position in one instrument.
///
/// Symbols are uppercased on construction so that lookups against
/// backend responses are case-insensitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub quantity: u32,
    pub avg_price: f64,
}

impl Holding {
    pub fn new(symbol: impl Into<String>, quantity: u32, avg_price: f64) -> Result<Self, CoreError> {
        let symbol = symbol.into().trim().to_uppercase();
        if symbol.is_empty() {
            return Err(CoreError::ValidationError("Holding symbol must not be empty".into()));
        }
        if quantity == 0 {
            return Err(CoreError::ValidationError(format!(
                "Holding {symbol}: quantity must be positive"
            )));
        }
        if !(avg_price.is_finite() && avg_price > 0.0) {
            return Err(CoreError::ValidationError(format!(
                "Holding {symbol}: average price must be positive"
            )));
        }
        Ok(Self {
            symbol,
            quantity,
            avg_price,
        })
    }

    /// Cost basis: quantity × average price.
    pub fn invested(&self) -> f64 {
        f64::from(self.quantity) * self.avg_price
    }
}

/// Valuation of a single holding at the current price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingValuation {
    pub symbol: String,
    pub quantity: u32,
    pub avg_price: f64,
    pub current_price: f64,
    pub invested: f64,
    pub current_value: f64,
    pub pnl: f64,
    pub pnl_percent: f64,
}

/// Point-in-time derived valuation of the whole portfolio.
/// Recomputed on every fetch, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub total_invested: f64,
    pub current_value: f64,
    pub total_pnl: f64,
    #[serde(default)]
    pub total_pnl_percent: f64,
    #[serde(default)]
    pub holdings: Vec<HoldingValuation>,
}

/// Request body of `POST /portfolio/calculate`.
#[derive(Debug, Clone, Serialize)]
pub struct ValuationRequest<'a> {
    pub holdings: &'a [Holding],
}
