use serde::{Deserialize, Serialize};

/// Result of a watchlist toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatchlistChange {
    Added,
    Removed,
}

/// Ordered set of watched symbols, held in process memory only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistSet {
    symbols: Vec<String>,
}

impl WatchlistSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a seed list. Duplicates after the first occurrence are dropped.
    pub fn from_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for s in symbols {
            set.add(s);
        }
        set
    }

    fn normalize(symbol: impl Into<String>) -> String {
        symbol.into().trim().to_uppercase()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        let upper = Self::normalize(symbol);
        self.symbols.iter().any(|s| *s == upper)
    }

    /// Append `symbol` if absent. Returns whether it was added.
    pub fn add(&mut self, symbol: impl Into<String>) -> bool {
        let upper = Self::normalize(symbol);
        if upper.is_empty() || self.symbols.contains(&upper) {
            return false;
        }
        self.symbols.push(upper);
        true
    }

    /// Remove `symbol` if present. Returns whether it was removed.
    pub fn remove(&mut self, symbol: &str) -> bool {
        let upper = Self::normalize(symbol);
        match self.symbols.iter().position(|s| *s == upper) {
            Some(idx) => {
                self.symbols.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Remove if present, append otherwise.
    pub fn toggle(&mut self, symbol: &str) -> WatchlistChange {
        if self.remove(symbol) {
            WatchlistChange::Removed
        } else {
            self.add(symbol);
            WatchlistChange::Added
        }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
