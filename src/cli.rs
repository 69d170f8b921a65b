use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

use spendtrack::aggregate;
use spendtrack::config::{default_data_dir, DATABASE_FILE};
use spendtrack::export::export_transactions_csv;
use spendtrack::format::{describe_difference, format_amount, truncate};
use spendtrack::models::{
    BudgetPatch, Category, Month, NewBudget, NewTransaction, TransactionPatch, TxnDate,
};
use spendtrack::seed::seed_store;
use spendtrack::{ReadPolicy, RecordKind, RecordStore, StoreConfig, StoreError};

const DESCRIPTION_WIDTH: usize = 32;

/// Local personal finance tracker: transactions, monthly budgets and
/// spending views.
#[derive(Parser, Debug)]
#[command(name = "spendtrack", version, about, long_about = None)]
pub(crate) struct Args {
    /// Directory holding the data files (default: the per-user data directory).
    #[arg(long, global = true, env = "SPENDTRACK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Where records are stored.
    #[arg(
        long,
        global = true,
        value_enum,
        env = "SPENDTRACK_BACKEND",
        default_value_t = BackendKind::Json
    )]
    backend: BackendKind,

    /// Fail instead of showing nothing when stored data cannot be read.
    #[arg(long, global = true)]
    strict_reads: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendKind {
    /// transactions.json and budgets.json
    Json,
    /// a single SQLite database file
    Sqlite,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record an expense
    Add {
        amount: Decimal,
        description: String,
        /// YYYY-MM-DD or an ISO 8601 date-time (default: today)
        #[arg(long)]
        date: Option<TxnDate>,
        /// Food, Rent, Travel, Shopping, Bills or Other (default: Other)
        #[arg(long)]
        category: Option<Category>,
    },
    /// Change fields of a recorded expense
    Edit {
        id: String,
        #[arg(long)]
        amount: Option<Decimal>,
        #[arg(long)]
        date: Option<TxnDate>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<Category>,
    },
    /// Delete an expense
    Rm { id: String },
    /// List expenses, newest first
    List {
        /// Only this month (YYYY-MM)
        #[arg(long)]
        month: Option<Month>,
    },
    /// Manage monthly category budgets
    Budget {
        #[command(subcommand)]
        action: BudgetCommand,
    },
    /// Headline figures over all expenses
    Summary,
    /// Spending per month for the last six months with spending
    Monthly,
    /// Budgets against actual spending for a month
    Compare {
        /// YYYY-MM (default: current month)
        #[arg(long)]
        month: Option<Month>,
    },
    /// Share of spending per category
    Breakdown,
    /// Write expenses to a CSV file
    Export {
        path: PathBuf,
        /// Only this month (YYYY-MM)
        #[arg(long)]
        month: Option<Month>,
    },
    /// Add sample expenses and budgets
    Seed,
}

#[derive(Subcommand, Debug)]
enum BudgetCommand {
    /// Set a spending limit for a category
    Set {
        category: Category,
        amount: Decimal,
        /// YYYY-MM (default: current month)
        #[arg(long)]
        month: Option<Month>,
    },
    /// Change a budget
    Edit {
        id: String,
        #[arg(long)]
        category: Option<Category>,
        #[arg(long)]
        amount: Option<Decimal>,
        #[arg(long)]
        month: Option<Month>,
    },
    /// Delete a budget
    Rm { id: String },
    /// List budgets, newest month first
    List,
}

pub(crate) fn run(args: Args) -> Result<()> {
    let config = store_config(&args)?;
    let store = RecordStore::open(&config)
        .with_context(|| format!("Failed to open data at {}", config.location().display()))?;

    match args.command {
        Command::Add {
            amount,
            description,
            date,
            category,
        } => cli_add(&store, amount, description, date, category),
        Command::Edit {
            id,
            amount,
            date,
            description,
            category,
        } => cli_edit(
            &store,
            &id,
            TransactionPatch {
                amount,
                date,
                description,
                category,
            },
        ),
        Command::Rm { id } => cli_rm(&store, &id),
        Command::List { month } => cli_list(&store, month),
        Command::Budget { action } => match action {
            BudgetCommand::Set {
                category,
                amount,
                month,
            } => cli_budget_set(&store, category, amount, month),
            BudgetCommand::Edit {
                id,
                category,
                amount,
                month,
            } => cli_budget_edit(
                &store,
                &id,
                BudgetPatch {
                    category,
                    amount,
                    month,
                },
            ),
            BudgetCommand::Rm { id } => cli_budget_rm(&store, &id),
            BudgetCommand::List => cli_budget_list(&store),
        },
        Command::Summary => cli_summary(&store),
        Command::Monthly => cli_monthly(&store),
        Command::Compare { month } => cli_compare(&store, month.unwrap_or_else(Month::current)),
        Command::Breakdown => cli_breakdown(&store),
        Command::Export { path, month } => cli_export(&store, &path, month),
        Command::Seed => cli_seed(&store),
    }
}

fn store_config(args: &Args) -> Result<StoreConfig> {
    let dir = match &args.data_dir {
        Some(dir) => dir.clone(),
        None => default_data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory, pass --data-dir"))?,
    };
    let config = match args.backend {
        BackendKind::Json => StoreConfig::json(dir),
        BackendKind::Sqlite => StoreConfig::sqlite(dir.join(DATABASE_FILE)),
    };
    let policy = if args.strict_reads {
        ReadPolicy::Strict
    } else {
        ReadPolicy::Degrade
    };
    Ok(config.with_read_policy(policy))
}

// ── Transactions ──────────────────────────────────────────────

fn cli_add(
    store: &RecordStore,
    amount: Decimal,
    description: String,
    date: Option<TxnDate>,
    category: Option<Category>,
) -> Result<()> {
    let mut new = NewTransaction::new(amount, date.unwrap_or_else(TxnDate::today), description);
    if let Some(category) = category {
        new = new.with_category(category);
    }
    let txn = store.create_transaction(new)?;
    println!(
        "Added {} {} on {} ({}), id {}",
        format_amount(txn.amount),
        txn.category,
        txn.date,
        txn.description,
        txn.id
    );
    Ok(())
}

fn cli_edit(store: &RecordStore, id: &str, patch: TransactionPatch) -> Result<()> {
    if patch.is_empty() {
        anyhow::bail!("Nothing to change: pass --amount, --date, --description or --category");
    }
    let txn = store
        .update_transaction(id, patch)?
        .ok_or_else(|| not_found(RecordKind::Transaction, id))?;
    println!(
        "Updated {}: {} {} on {} ({})",
        txn.id,
        format_amount(txn.amount),
        txn.category,
        txn.date,
        txn.description
    );
    Ok(())
}

fn cli_rm(store: &RecordStore, id: &str) -> Result<()> {
    if !store.delete_transaction(id)? {
        return Err(not_found(RecordKind::Transaction, id).into());
    }
    println!("Deleted transaction {id}");
    Ok(())
}

fn cli_list(store: &RecordStore, month: Option<Month>) -> Result<()> {
    let mut txns = store.transactions_for_display()?;
    if let Some(month) = month {
        txns.retain(|t| month.contains(&t.date));
    }
    if txns.is_empty() {
        println!("No transactions");
        return Ok(());
    }

    println!(
        "{:<10}  {:<8}  {:<width$}  {:>12}  ID",
        "Date",
        "Category",
        "Description",
        "Amount",
        width = DESCRIPTION_WIDTH
    );
    println!("{}", "─".repeat(DESCRIPTION_WIDTH + 60));
    for txn in &txns {
        println!(
            "{:<10}  {:<8}  {:<width$}  {:>12}  {}",
            txn.date.day().format("%Y-%m-%d").to_string(),
            txn.category.as_str(),
            truncate(&txn.description, DESCRIPTION_WIDTH),
            format_amount(txn.amount),
            txn.id,
            width = DESCRIPTION_WIDTH
        );
    }
    println!(
        "{} transactions, {} total",
        txns.len(),
        format_amount(aggregate::total_expenses(&txns))
    );
    Ok(())
}

// ── Budgets ───────────────────────────────────────────────────

fn cli_budget_set(
    store: &RecordStore,
    category: Category,
    amount: Decimal,
    month: Option<Month>,
) -> Result<()> {
    let month = month.unwrap_or_else(Month::current);
    let budget = store.create_budget(NewBudget::new(category, amount, month))?;
    println!(
        "Budget set: {} {} for {}, id {}",
        budget.category,
        format_amount(budget.amount),
        budget.month.long_name(),
        budget.id
    );
    Ok(())
}

fn cli_budget_edit(store: &RecordStore, id: &str, patch: BudgetPatch) -> Result<()> {
    if patch.is_empty() {
        anyhow::bail!("Nothing to change: pass --category, --amount or --month");
    }
    let budget = store
        .update_budget(id, patch)?
        .ok_or_else(|| not_found(RecordKind::Budget, id))?;
    println!(
        "Updated {}: {} {} for {}",
        budget.id,
        budget.category,
        format_amount(budget.amount),
        budget.month.long_name()
    );
    Ok(())
}

fn cli_budget_rm(store: &RecordStore, id: &str) -> Result<()> {
    if !store.delete_budget(id)? {
        return Err(not_found(RecordKind::Budget, id).into());
    }
    println!("Deleted budget {id}");
    Ok(())
}

fn cli_budget_list(store: &RecordStore) -> Result<()> {
    let budgets = store.budgets_for_display()?;
    if budgets.is_empty() {
        println!("No budgets");
        return Ok(());
    }

    println!("{:<8} {:<10} {:>12}  ID", "Month", "Category", "Amount");
    println!("{}", "─".repeat(60));
    for budget in &budgets {
        println!(
            "{:<8} {:<10} {:>12}  {}",
            budget.month.to_string(),
            budget.category.as_str(),
            format_amount(budget.amount),
            budget.id
        );
    }
    Ok(())
}

// ── Views ─────────────────────────────────────────────────────

fn cli_summary(store: &RecordStore) -> Result<()> {
    let txns = store.list_transactions()?;
    let summary = aggregate::summarize(&txns, aggregate::reference_now());

    println!("spendtrack summary");
    println!("{}", "─".repeat(40));
    println!("  Total spent:    {}", format_amount(summary.total));
    println!("  Transactions:   {}", summary.count);
    println!(
        "  Daily average:  {} (last {} days)",
        format_amount(summary.daily_average),
        aggregate::ROLLING_WINDOW_DAYS
    );
    match summary.top_category {
        Some((category, total)) => {
            println!("  Top category:   {category} ({})", format_amount(total));
        }
        None => println!("  Top category:   -"),
    }
    match &summary.most_recent {
        Some(txn) => println!(
            "  Most recent:    {} {} on {}",
            truncate(&txn.description, DESCRIPTION_WIDTH),
            format_amount(txn.amount),
            txn.date.day()
        ),
        None => println!("  Most recent:    -"),
    }

    let totals = aggregate::category_totals(&txns);
    if !txns.is_empty() {
        println!();
        println!("Spending by Category:");
        for (category, total) in &totals {
            println!("  {:<10} {:>12}", category.as_str(), format_amount(*total));
        }
    }
    Ok(())
}

fn cli_monthly(store: &RecordStore) -> Result<()> {
    let txns = store.list_transactions()?;
    let series = aggregate::monthly_series(&txns);
    if series.is_empty() {
        println!("No transactions");
        return Ok(());
    }
    for entry in &series {
        println!(
            "  {:<16} {:>12}  ({} transactions)",
            entry.month.long_name(),
            format_amount(entry.total),
            entry.count
        );
    }
    Ok(())
}

fn cli_compare(store: &RecordStore, month: Month) -> Result<()> {
    let budgets = store.list_budgets()?;
    let txns = store.list_transactions()?;
    let comparison = aggregate::budget_vs_actual(&budgets, &txns, month);
    if comparison.is_empty() {
        println!("No budgets set for {}", month.long_name());
        return Ok(());
    }

    println!("Budget vs actual, {}", month.long_name());
    println!("{}", "─".repeat(64));
    println!("{:<10} {:>12} {:>12}  Status", "Category", "Budget", "Actual");
    for row in &comparison {
        println!(
            "{:<10} {:>12} {:>12}  {}",
            row.category.as_str(),
            format_amount(row.budget),
            format_amount(row.actual),
            describe_difference(row.difference)
        );
    }
    Ok(())
}

fn cli_breakdown(store: &RecordStore) -> Result<()> {
    let txns = store.list_transactions()?;
    let shares = aggregate::category_breakdown(&txns);
    if shares.is_empty() {
        println!("No transactions");
        return Ok(());
    }
    for share in &shares {
        println!(
            "  {:<10} {:>12} {:>6}%",
            share.category.as_str(),
            format_amount(share.total),
            share.percent
        );
    }
    Ok(())
}

fn cli_export(store: &RecordStore, path: &Path, month: Option<Month>) -> Result<()> {
    let txns = store.transactions_for_display()?;
    let count = export_transactions_csv(path, &txns, month)?;
    if count == 0 {
        match month {
            Some(month) => println!("No transactions for {month}"),
            None => println!("No transactions"),
        }
    } else {
        println!("Exported {count} transactions to {}", path.display());
    }
    Ok(())
}

fn cli_seed(store: &RecordStore) -> Result<()> {
    let report = seed_store(store)?;
    println!("Created {} sample transactions", report.transactions);
    println!("Created {} sample budgets", report.budgets);
    if report.skipped_budgets > 0 {
        println!(
            "Skipped {} sample budgets that already exist",
            report.skipped_budgets
        );
    }
    Ok(())
}

fn not_found(kind: RecordKind, id: &str) -> StoreError {
    StoreError::NotFound {
        kind,
        id: id.to_string(),
    }
}
