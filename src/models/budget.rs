use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{validate_amount, Category, Month};
use crate::error::StoreError;

/// A spending ceiling for one category in one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    #[serde(alias = "_id")]
    pub id: String,
    pub category: Category,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    pub month: Month,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewBudget {
    pub category: Category,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    pub month: Month,
}

impl NewBudget {
    pub fn new(category: Category, amount: Decimal, month: Month) -> Self {
        Self {
            category,
            amount,
            month,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), StoreError> {
        validate_amount(self.amount)
    }

    pub(crate) fn into_record(self, id: String, now: DateTime<Utc>) -> Budget {
        Budget {
            id,
            category: self.category,
            amount: self.amount,
            month: self.month,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BudgetPatch {
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub month: Option<Month>,
}

impl BudgetPatch {
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.amount.is_none() && self.month.is_none()
    }

    pub(crate) fn validate(&self) -> Result<(), StoreError> {
        match self.amount {
            Some(amount) => validate_amount(amount),
            None => Ok(()),
        }
    }

    /// The (category, month) pair the budget would have after this patch.
    pub(crate) fn target_key(&self, current: &Budget) -> (Category, Month) {
        (
            self.category.unwrap_or(current.category),
            self.month.unwrap_or(current.month),
        )
    }

    pub(crate) fn apply(self, budget: &mut Budget) {
        if let Some(category) = self.category {
            budget.category = category;
        }
        if let Some(amount) = self.amount {
            budget.amount = amount;
        }
        if let Some(month) = self.month {
            budget.month = month;
        }
    }
}
