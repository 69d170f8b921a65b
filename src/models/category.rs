use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// The fixed set of expense classifications.
///
/// Variant order is the enumeration order used by aggregations (and by
/// `Ord`), which is not the same as alphabetical order of the names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    Food,
    Rent,
    Travel,
    Shopping,
    Bills,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Self::Food,
        Self::Rent,
        Self::Travel,
        Self::Shopping,
        Self::Bills,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Rent => "Rent",
            Self::Travel => "Travel",
            Self::Shopping => "Shopping",
            Self::Bills => "Bills",
            Self::Other => "Other",
        }
    }

    /// Parse user input, case-insensitively. Unknown names are rejected
    /// rather than mapped to `Other`.
    pub fn parse(s: &str) -> Result<Self, StoreError> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().to_lowercase() == lower)
            .ok_or_else(|| {
                StoreError::validation(
                    "category",
                    format!("'{s}' is not one of Food, Rent, Travel, Shopping, Bills, Other"),
                )
            })
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
