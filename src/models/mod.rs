mod budget;
mod category;
mod date;
mod month;
mod transaction;

pub use budget::{Budget, BudgetPatch, NewBudget};
pub use category::Category;
pub use date::TxnDate;
pub use month::Month;
pub use transaction::{NewTransaction, Transaction, TransactionPatch};

use rust_decimal::Decimal;

use crate::error::StoreError;

pub(crate) fn validate_amount(amount: Decimal) -> Result<(), StoreError> {
    if amount <= Decimal::ZERO {
        return Err(StoreError::validation(
            "amount",
            format!("{amount} is not a positive amount"),
        ));
    }
    Ok(())
}

pub(crate) fn validate_description(description: &str) -> Result<(), StoreError> {
    if description.trim().is_empty() {
        return Err(StoreError::validation("description", "must not be empty"));
    }
    Ok(())
}
