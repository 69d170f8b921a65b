//! Derived spending views.
//!
//! Everything here is a pure function of the records passed in. The
//! current time is always a parameter so results are reproducible.

use chrono::{Duration, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::models::{Budget, Category, Month, Transaction};

/// Length of the trailing window used by [`rolling_daily_average`], and
/// the divisor applied to its sum.
pub const ROLLING_WINDOW_DAYS: i64 = 30;

/// How many months [`monthly_series`] keeps.
pub const SERIES_MONTHS: usize = 6;

/// The current instant on the same clock as [`crate::models::TxnDate::at`]:
/// UTC, which date-times carrying an offset are normalised to.
pub fn reference_now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyTotal {
    pub month: Month,
    pub total: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetComparison {
    pub category: Category,
    pub budget: Decimal,
    pub actual: Decimal,
    /// `actual - budget`; positive means over budget.
    pub difference: Decimal,
}

impl BudgetComparison {
    pub fn is_over(&self) -> bool {
        self.difference > Decimal::ZERO
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryShare {
    pub category: Category,
    pub total: Decimal,
    /// Share of all spending, in percent, one decimal place.
    pub percent: Decimal,
}

/// The headline figures shown on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total: Decimal,
    pub count: usize,
    pub daily_average: Decimal,
    pub top_category: Option<(Category, Decimal)>,
    pub most_recent: Option<Transaction>,
}

pub fn total_expenses(txns: &[Transaction]) -> Decimal {
    txns.iter().map(|t| t.amount).sum()
}

/// Spending per category. Every category is present, unused ones at zero,
/// and iteration follows the category enumeration order.
pub fn category_totals(txns: &[Transaction]) -> BTreeMap<Category, Decimal> {
    let mut totals: BTreeMap<Category, Decimal> =
        Category::ALL.iter().map(|c| (*c, Decimal::ZERO)).collect();
    for txn in txns {
        *totals.entry(txn.category).or_default() += txn.amount;
    }
    totals
}

/// The category with the highest total. Ties go to the category that comes
/// first in enumeration order; `None` when there are no transactions.
pub fn top_category(txns: &[Transaction]) -> Option<(Category, Decimal)> {
    if txns.is_empty() {
        return None;
    }
    category_totals(txns)
        .into_iter()
        .fold(None, |best, (category, total)| match best {
            Some((_, best_total)) if best_total >= total => best,
            _ => Some((category, total)),
        })
}

/// The transaction with the latest `date`; on equal dates the one listed
/// first wins.
pub fn most_recent(txns: &[Transaction]) -> Option<&Transaction> {
    txns.iter().fold(None, |latest, txn| match latest {
        Some(l) if txn.date.at() <= l.date.at() => Some(l),
        _ => Some(txn),
    })
}

/// Spending over the trailing [`ROLLING_WINDOW_DAYS`] ending at `now`,
/// divided by the window length. This is a rate over a nominal window, not
/// the mean transaction size and not corrected for shorter histories.
pub fn rolling_daily_average(txns: &[Transaction], now: NaiveDateTime) -> Decimal {
    let start = now - Duration::days(ROLLING_WINDOW_DAYS);
    let window_total: Decimal = txns
        .iter()
        .filter(|t| {
            let at = t.date.at();
            at >= start && at <= now
        })
        .map(|t| t.amount)
        .sum();
    window_total / Decimal::from(ROLLING_WINDOW_DAYS)
}

/// Totals and counts per month, oldest first, limited to the most recent
/// [`SERIES_MONTHS`] months that have any spending.
pub fn monthly_series(txns: &[Transaction]) -> Vec<MonthlyTotal> {
    let mut by_month: BTreeMap<Month, (Decimal, usize)> = BTreeMap::new();
    for txn in txns {
        let entry = by_month.entry(txn.date.month()).or_default();
        entry.0 += txn.amount;
        entry.1 += 1;
    }
    let skip = by_month.len().saturating_sub(SERIES_MONTHS);
    by_month
        .into_iter()
        .skip(skip)
        .map(|(month, (total, count))| MonthlyTotal {
            month,
            total,
            count,
        })
        .collect()
}

pub fn transactions_in_month(txns: &[Transaction], month: Month) -> Vec<&Transaction> {
    txns.iter().filter(|t| month.contains(&t.date)).collect()
}

/// Budget against actual spending for each budget set for `month`, in the
/// order the budgets were given. Categories without a budget are left out
/// even when they have spending.
pub fn budget_vs_actual(
    budgets: &[Budget],
    txns: &[Transaction],
    month: Month,
) -> Vec<BudgetComparison> {
    let mut actuals: BTreeMap<Category, Decimal> = BTreeMap::new();
    for txn in transactions_in_month(txns, month) {
        *actuals.entry(txn.category).or_default() += txn.amount;
    }
    budgets
        .iter()
        .filter(|b| b.month == month)
        .map(|b| {
            let actual = actuals.get(&b.category).copied().unwrap_or_default();
            BudgetComparison {
                category: b.category,
                budget: b.amount,
                actual,
                difference: actual - b.amount,
            }
        })
        .collect()
}

/// Categories with spending, largest first, with their share of the total.
pub fn category_breakdown(txns: &[Transaction]) -> Vec<CategoryShare> {
    let grand_total = total_expenses(txns);
    if grand_total.is_zero() {
        return Vec::new();
    }
    let mut shares: Vec<CategoryShare> = category_totals(txns)
        .into_iter()
        .filter(|(_, total)| *total > Decimal::ZERO)
        .map(|(category, total)| CategoryShare {
            category,
            total,
            percent: (total * Decimal::ONE_HUNDRED / grand_total).round_dp(1),
        })
        .collect();
    shares.sort_by(|a, b| b.total.cmp(&a.total));
    shares
}

pub fn summarize(txns: &[Transaction], now: NaiveDateTime) -> Summary {
    Summary {
        total: total_expenses(txns),
        count: txns.len(),
        daily_average: rolling_daily_average(txns, now),
        top_category: top_category(txns),
        most_recent: most_recent(txns).cloned(),
    }
}
