use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// A named, mutually exclusive view region of the dashboard.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    #[default]
    Overview,
    Portfolio,
    Stocks,
    #[serde(rename = "mutualfunds")]
    MutualFunds,
    Watchlist,
    Orders,
    Profile,
}

impl Section {
    pub const ALL: [Section; 7] = [
        Section::Overview,
        Section::Portfolio,
        Section::Stocks,
        Section::MutualFunds,
        Section::Watchlist,
        Section::Orders,
        Section::Profile,
    ];

    /// Navigation key, as used by `data-page` attributes.
    pub fn key(&self) -> &'static str {
        match self {
            Section::Overview => "overview",
            Section::Portfolio => "portfolio",
            Section::Stocks => "stocks",
            Section::MutualFunds => "mutualfunds",
            Section::Watchlist => "watchlist",
            Section::Orders => "orders",
            Section::Profile => "profile",
        }
    }

    /// Page title shown while the section is active.
    pub fn title(&self) -> &'static str {
        match self {
            Section::Overview => "Dashboard",
            Section::Portfolio => "Portfolio",
            Section::Stocks => "Explore Stocks",
            Section::MutualFunds => "Mutual Funds",
            Section::Watchlist => "Watchlist",
            Section::Orders => "Orders",
            Section::Profile => "Profile",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for Section {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .iter()
            .copied()
            .find(|sec| sec.key() == s)
            .ok_or_else(|| CoreError::ValidationError(format!("Unknown section: {s}")))
    }
}

/// Which section is active. Holding a single value makes the
/// "exactly one active" rule structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionVisibility {
    active: Section,
}

impl SectionVisibility {
    pub fn new(initial: Section) -> Self {
        Self { active: initial }
    }

    pub fn active(&self) -> Section {
        self.active
    }

    pub fn is_active(&self, section: Section) -> bool {
        self.active == section
    }

    /// Activate `section`. Returns the previously active section.
    pub fn activate(&mut self, section: Section) -> Section {
        std::mem::replace(&mut self.active, section)
    }

    /// Active flags for every section; exactly one is `true`.
    pub fn flags(&self) -> Vec<(Section, bool)> {
        Section::ALL
            .iter()
            .map(|s| (*s, *s == self.active))
            .collect()
    }
}

impl Default for SectionVisibility {
    fn default() -> Self {
        Self::new(Section::default())
    }
}
