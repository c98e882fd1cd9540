use serde::{Deserialize, Serialize};

use super::period::Period;

/// Moving-average windows the backend supplies alongside the price series.
pub const MA_SHORT_WINDOW: usize = 20;
pub const MA_LONG_WINDOW: usize = 50;

/// Labeled price series for one instrument and period
/// (`GET /stock/chart/{symbol}?period=`).
///
/// Produced fresh per request and never mutated after parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub symbol: String,
    pub labels: Vec<String>,
    pub datasets: ChartDatasets,
    #[serde(default)]
    pub current_price: f64,
    pub period: Period,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartDatasets {
    pub price: Vec<f64>,
    #[serde(default)]
    pub volume: Vec<u64>,
    /// Zero until the 20-point window is full. Empty if the backend omitted it.
    #[serde(default)]
    pub ma20: Vec<f64>,
    /// Zero until the 50-point window is full. Empty if the backend omitted it.
    #[serde(default)]
    pub ma50: Vec<f64>,
}

impl ChartSeries {
    /// Supplied moving average for `window`, or a locally computed one when
    /// the backend left it out.
    pub fn moving_average(&self, window: usize) -> Vec<f64> {
        let supplied = match window {
            MA_SHORT_WINDOW => Some(&self.datasets.ma20),
            MA_LONG_WINDOW => Some(&self.datasets.ma50),
            _ => None,
        };
        match supplied {
            Some(values) if !values.is_empty() => values.clone(),
            _ => simple_moving_average(&self.datasets.price, window),
        }
    }

    /// Last price at or above the first one.
    pub fn is_rising(&self) -> bool {
        match (self.datasets.price.first(), self.datasets.price.last()) {
            (Some(first), Some(last)) => last >= first,
            _ => true,
        }
    }
}

/// Rolling mean rounded to 2 decimals, zero-filled until the window is full.
pub fn simple_moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 {
        return vec![0.0; values.len()];
    }
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, v) in values.iter().enumerate() {
        sum += v;
        if i >= window {
            sum -= values[i - window];
        }
        if i + 1 >= window {
            out.push(round2(sum / window as f64));
        } else {
            out.push(0.0);
        }
    }
    out
}

pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// ── Rendering contract ──────────────────────────────────────────────

/// Full chart or reduced-chrome sparkline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartMode {
    Full,
    Mini,
}

impl ChartMode {
    pub fn options(&self) -> ChartOptions {
        match self {
            ChartMode::Full => ChartOptions {
                show_legend: true,
                show_tooltip: true,
                show_axes: true,
            },
            ChartMode::Mini => ChartOptions {
                show_legend: false,
                show_tooltip: false,
                show_axes: false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartOptions {
    pub show_legend: bool,
    pub show_tooltip: bool,
    pub show_axes: bool,
}

/// Direction of a series from its first to its last point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Rising,
    Falling,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSpec {
    pub label: String,
    pub data: Vec<f64>,
    /// Passed to the chart but not drawn.
    pub hidden: bool,
}

/// Everything a chart backend needs to draw one chart instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub mode: ChartMode,
    pub title: Option<String>,
    pub labels: Vec<String>,
    pub datasets: Vec<DatasetSpec>,
    pub options: ChartOptions,
    pub trend: Trend,
}

impl ChartSpec {
    pub fn from_series(series: &ChartSeries, mode: ChartMode) -> Self {
        let trend = if series.is_rising() {
            Trend::Rising
        } else {
            Trend::Falling
        };
        let price = DatasetSpec {
            label: format!("{} Price", series.symbol),
            data: series.datasets.price.clone(),
            hidden: false,
        };

        let (title, datasets) = match mode {
            ChartMode::Full => {
                let mut datasets = vec![price];
                for window in [MA_SHORT_WINDOW, MA_LONG_WINDOW] {
                    datasets.push(moving_average_dataset(series, window));
                }
                let title = format!(
                    "{} - {}",
                    series.symbol,
                    series.period.as_str().to_uppercase()
                );
                (Some(title), datasets)
            }
            ChartMode::Mini => (None, vec![price]),
        };

        Self {
            mode,
            title,
            labels: series.labels.clone(),
            datasets,
            options: mode.options(),
            trend,
        }
    }

    /// Single-dataset spec for a derived series such as portfolio value.
    pub fn single(
        label: impl Into<String>,
        labels: Vec<String>,
        data: Vec<f64>,
        mode: ChartMode,
    ) -> Self {
        let trend = match (data.first(), data.last()) {
            (Some(first), Some(last)) if last < first => Trend::Falling,
            _ => Trend::Rising,
        };
        Self {
            mode,
            title: None,
            labels,
            datasets: vec![DatasetSpec {
                label: label.into(),
                data,
                hidden: false,
            }],
            options: mode.options(),
            trend,
        }
    }
}

/// Moving-average dataset, hidden while fewer than `window` values are
/// meaningful (positive).
fn moving_average_dataset(series: &ChartSeries, window: usize) -> DatasetSpec {
    let data = series.moving_average(window);
    let meaningful = data.iter().filter(|v| **v > 0.0).count();
    DatasetSpec {
        label: format!("MA {window}"),
        hidden: meaningful < window,
        data,
    }
}
