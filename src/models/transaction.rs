use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{validate_amount, validate_description, Category, TxnDate};
use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    pub date: TxnDate,
    pub description: String,
    #[serde(default)]
    pub category: Category,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new transaction. The id and timestamps are
/// always assigned by the store.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewTransaction {
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    pub date: TxnDate,
    pub description: String,
    #[serde(default)]
    pub category: Option<Category>,
}

impl NewTransaction {
    pub fn new(amount: Decimal, date: TxnDate, description: impl Into<String>) -> Self {
        Self {
            amount,
            date,
            description: description.into(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), StoreError> {
        validate_amount(self.amount)?;
        validate_description(&self.description)
    }

    pub(crate) fn into_record(
        self,
        id: String,
        now: DateTime<Utc>,
    ) -> Transaction {
        Transaction {
            id,
            amount: self.amount,
            date: self.date,
            description: self.description.trim().to_string(),
            category: self.category.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Field-level partial update. Absent fields are left as they are; unknown
/// keys are rejected when deserialising.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransactionPatch {
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub date: Option<TxnDate>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
}

impl TransactionPatch {
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.date.is_none()
            && self.description.is_none()
            && self.category.is_none()
    }

    pub(crate) fn validate(&self) -> Result<(), StoreError> {
        if let Some(amount) = self.amount {
            validate_amount(amount)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        Ok(())
    }

    pub(crate) fn apply(self, txn: &mut Transaction) {
        if let Some(amount) = self.amount {
            txn.amount = amount;
        }
        if let Some(date) = self.date {
            txn.date = date;
        }
        if let Some(description) = self.description {
            txn.description = description.trim().to_string();
        }
        if let Some(category) = self.category {
            txn.category = category;
        }
    }
}
