//! Category ranking for dequeue ordering.
//!
//! The ranking is a total order over categories supplied by configuration,
//! highest priority first. Categories that are not listed rank below every
//! listed one and are served FIFO among themselves.
//!
//! Default ranking:
//! > premium > essential > highlight > basic > free

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::types::Category;

/// Default ranking, highest priority first.
pub const DEFAULT_RANKING: &[&str] = &["premium", "essential", "highlight", "basic", "free"];

/// Error parsing a ranking from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("category ranking must list at least one category")]
pub struct EmptyRanking;

/// A configured total order over categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRanking {
    order: Vec<Category>,
}

impl CategoryRanking {
    /// Creates a ranking from categories listed highest priority first.
    ///
    /// Repeated categories keep their first position.
    pub fn new(order: impl IntoIterator<Item = Category>) -> Self {
        let mut ranked: Vec<Category> = Vec::new();
        for category in order {
            if !ranked.contains(&category) {
                ranked.push(category);
            }
        }
        CategoryRanking { order: ranked }
    }

    /// Returns the rank of a category; 0 is served first.
    ///
    /// Unlisted categories all share the lowest rank.
    pub fn rank(&self, category: &Category) -> usize {
        self.order
            .iter()
            .position(|c| c == category)
            .unwrap_or(self.order.len())
    }

    /// The listed categories, highest priority first.
    pub fn categories(&self) -> &[Category] {
        &self.order
    }
}

impl Default for CategoryRanking {
    fn default() -> Self {
        CategoryRanking::new(DEFAULT_RANKING.iter().map(|c| Category::new(c)))
    }
}

impl FromStr for CategoryRanking {
    type Err = EmptyRanking;

    /// Parses a comma-separated list, e.g. `premium,essential,free`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ranking = CategoryRanking::new(
            s.split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(Category::new),
        );
        if ranking.order.is_empty() {
            return Err(EmptyRanking);
        }
        Ok(ranking)
    }
}

impl fmt::Display for CategoryRanking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.order.iter().map(Category::as_str).collect();
        write!(f, "{}", names.join(" > "))
    }
}
