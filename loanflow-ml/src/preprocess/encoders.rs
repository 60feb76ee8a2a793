//! Categorical encoders.

use serde::{Deserialize, Serialize};

/// Category a null cell is encoded as.
pub const MISSING_CATEGORY: &str = "missing";

fn sorted_categories<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    let mut categories: Vec<String> = values
        .map(|v| v.unwrap_or(MISSING_CATEGORY).to_string())
        .collect();
    categories.sort();
    categories.dedup();
    categories
}

/// One indicator per category seen at fit. An unseen category encodes as all zeros.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    categories: Vec<String>,
}

impl OneHotEncoder {
    pub fn fit<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Self {
        Self {
            categories: sorted_categories(values),
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn width(&self) -> usize {
        self.categories.len()
    }

    pub fn encode_into(&self, value: Option<&str>, out: &mut Vec<f64>) {
        let value = value.unwrap_or(MISSING_CATEGORY);
        let hit = self.categories.binary_search_by(|c| c.as_str().cmp(value)).ok();
        out.extend((0..self.categories.len()).map(|i| if Some(i) == hit { 1.0 } else { 0.0 }));
    }

    pub fn feature_names(&self, column: &str) -> Vec<String> {
        self.categories
            .iter()
            .map(|c| format!("{column}_{c}"))
            .collect()
    }
}

/// Rank of the category among those seen at fit, `-1` when unseen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdinalEncoder {
    categories: Vec<String>,
}

impl OrdinalEncoder {
    /// Code emitted for a category not seen at fit.
    pub const UNKNOWN: f64 = -1.0;

    pub fn fit<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Self {
        Self {
            categories: sorted_categories(values),
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn encode(&self, value: Option<&str>) -> f64 {
        let value = value.unwrap_or(MISSING_CATEGORY);
        match self.categories.binary_search_by(|c| c.as_str().cmp(value)) {
            Ok(rank) => rank as f64,
            Err(_) => Self::UNKNOWN,
        }
    }
}
