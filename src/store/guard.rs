use crate::error::{Result, StoreError};
use crate::models::{Budget, Category, Month};

/// Passes when no budget other than `except_id` already covers
/// `category` in `month`.
///
/// Must be called with the budget collection lock held, on the records
/// about to be saved.
pub(crate) fn ensure_unique(
    budgets: &[Budget],
    category: Category,
    month: Month,
    except_id: Option<&str>,
) -> Result<()> {
    let clash = budgets.iter().any(|b| {
        b.category == category && b.month == month && except_id != Some(b.id.as_str())
    });
    if clash {
        tracing::debug!(%category, %month, "rejected duplicate budget");
        return Err(StoreError::DuplicateBudget { category, month });
    }
    Ok(())
}
