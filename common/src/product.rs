use std::fmt;

use serde::{Deserialize, Serialize};

/// Product identifier, unique across the whole catalog.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Broad chemical family used for marketplace filtering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductCategory {
    Acids,
    Alcohols,
    Bases,
    Salts,
    Solvents,
    Polymers,
    Petrochemicals,
    Other(String),
}

impl ProductCategory {
    pub fn name(&self) -> &str {
        match self {
            ProductCategory::Acids => "Acids",
            ProductCategory::Alcohols => "Alcohols",
            ProductCategory::Bases => "Bases",
            ProductCategory::Salts => "Salts",
            ProductCategory::Solvents => "Solvents",
            ProductCategory::Polymers => "Polymers",
            ProductCategory::Petrochemicals => "Petrochemicals",
            ProductCategory::Other(name) => name,
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Closing price for one month, e.g. `2024-06`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub month: String,
    pub price: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceTrend {
    Up,
    Down,
    Flat,
}

/// Movement between the last two recorded months.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceChange {
    pub previous: u64,
    pub current: u64,
    pub percent: f64,
    pub trend: PriceTrend,
}

/// A chemical listed by a seller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub grade: String,
    pub category: ProductCategory,
    /// Price per `unit`, in whole rupees.
    pub price: u64,
    pub unit: String,
    #[serde(default)]
    pub price_history: Vec<PricePoint>,
}

impl Product {
    /// `None` until at least two months of history exist.
    pub fn price_change(&self) -> Option<PriceChange> {
        let [.., prev, last] = self.price_history.as_slice() else {
            return None;
        };
        let trend = match last.price.cmp(&prev.price) {
            std::cmp::Ordering::Greater => PriceTrend::Up,
            std::cmp::Ordering::Less => PriceTrend::Down,
            std::cmp::Ordering::Equal => PriceTrend::Flat,
        };
        let percent = if prev.price == 0 {
            0.0
        } else {
            (last.price as f64 - prev.price as f64) / prev.price as f64 * 100.0
        };
        Some(PriceChange {
            previous: prev.price,
            current: last.price,
            percent,
            trend,
        })
    }

    /// Case-insensitive match on name or category, as the marketplace search box does.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.name.to_lowercase().contains(&query)
            || self.category.name().to_lowercase().contains(&query)
    }
}
