use std::collections::HashMap;

use crate::models::chart::{round2, ChartSeries};
use crate::models::portfolio::{Holding, HoldingValuation, PortfolioSnapshot};

/// Derives valuations from holdings and prices.
///
/// Mirrors the backend's `/portfolio/calculate` arithmetic so snapshots can
/// also be built from prices already on hand (e.g. a batch quote fetch).
pub struct PortfolioService;

impl PortfolioService {
    pub fn new() -> Self {
        Self
    }

    /// Value one holding at `current_price`. Monetary fields are rounded to
    /// 2 decimals; P&L percent is relative to the invested amount.
    pub fn value_holding(&self, holding: &Holding, current_price: f64) -> HoldingValuation {
        let quantity = f64::from(holding.quantity);
        let invested = holding.invested();
        let current_value = quantity * current_price;
        let pnl = current_value - invested;
        let pnl_percent = if invested != 0.0 {
            pnl / invested * 100.0
        } else {
            0.0
        };

        HoldingValuation {
            symbol: holding.symbol.clone(),
            quantity: holding.quantity,
            avg_price: round2(holding.avg_price),
            current_price: round2(current_price),
            invested: round2(invested),
            current_value: round2(current_value),
            pnl: round2(pnl),
            pnl_percent: round2(pnl_percent),
        }
    }

    /// Build a snapshot from `prices` (keyed by uppercase symbol).
    /// Holdings without a price are left out, as the backend does.
    pub fn compute_snapshot(
        &self,
        holdings: &[Holding],
        prices: &HashMap<String, f64>,
    ) -> PortfolioSnapshot {
        let mut total_invested = 0.0;
        let mut current_value = 0.0;
        let mut valuations = Vec::new();

        for holding in holdings {
            let Some(&price) = prices.get(&holding.symbol.to_uppercase()) else {
                continue;
            };
            total_invested += holding.invested();
            current_value += f64::from(holding.quantity) * price;
            valuations.push(self.value_holding(holding, price));
        }

        let total_pnl = current_value - total_invested;
        let total_pnl_percent = if total_invested != 0.0 {
            total_pnl / total_invested * 100.0
        } else {
            0.0
        };

        PortfolioSnapshot {
            total_invested: round2(total_invested),
            current_value: round2(current_value),
            total_pnl: round2(total_pnl),
            total_pnl_percent: round2(total_pnl_percent),
            holdings: valuations,
        }
    }

    /// Portfolio value over time: Σ quantity × price at each aligned point.
    ///
    /// Series are aligned by index over the shortest one; labels come from the
    /// first series. Holdings with no matching series are skipped.
    pub fn value_series(
        &self,
        holdings: &[Holding],
        series: &[ChartSeries],
    ) -> (Vec<String>, Vec<f64>) {
        let matched: Vec<(f64, &ChartSeries)> = holdings
            .iter()
            .filter_map(|h| {
                series
                    .iter()
                    .find(|s| s.symbol.eq_ignore_ascii_case(&h.symbol))
                    .map(|s| (f64::from(h.quantity), s))
            })
            .collect();

        let Some(len) = matched
            .iter()
            .map(|(_, s)| s.datasets.price.len().min(s.labels.len()))
            .min()
        else {
            return (Vec::new(), Vec::new());
        };

        let labels = matched[0].1.labels[..len].to_vec();
        let values = (0..len)
            .map(|i| {
                round2(
                    matched
                        .iter()
                        .map(|(qty, s)| qty * s.datasets.price[i])
                        .sum(),
                )
            })
            .collect();
        (labels, values)
    }
}

impl Default for PortfolioService {
    fn default() -> Self {
        Self::new()
    }
}
