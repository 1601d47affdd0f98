//! Financial summary arithmetic: totals, ROI, burn rate, budget health.
//!
//! Expense totals always include paid crew honors (milestones with
//! `payment_status = 'Paid'`) on top of recorded `Expense` transactions.

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::error::CoreError;
use crate::types::Money;

/// Category prefix of the `Expense` rows recorded when a crew honor is paid.
///
/// Display only. Totals recognise payout rows by their `milestone_id`.
pub const CREW_HONOR_CATEGORY_PREFIX: &str = "Honor Crew: ";

/// Category of the expense row recorded for a paid crew honor.
pub fn crew_honor_category(crew_name: &str, task_name: &str) -> String {
    format!("{CREW_HONOR_CATEGORY_PREFIX}{crew_name} - {task_name}")
}

/// Description of the expense row recorded for a paid crew honor.
pub fn crew_honor_description(task_name: &str, project_title: &str) -> String {
    format!("Payment for {task_name} in {project_title}")
}

/// Aggregated finance rows for a set of projects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FinanceTotals {
    /// Sum of `Expense` transactions regardless of status, excluding payout
    /// rows of milestones that are still paid.
    pub expense: Money,
    /// Sum of `Income` transactions with status `Received`.
    pub income_received: Money,
    /// Sum of `Income` transactions with status `Pending` (accounts receivable).
    pub income_pending: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FinancialSummary {
    pub total_income: Money,
    pub total_expense: Money,
    pub crew_expense: Money,
    pub total_expense_with_crew: Money,
    pub pending_ar: Money,
    pub net_profit: Money,
}

/// Combine transaction totals with paid crew honors.
pub fn summarize(totals: FinanceTotals, crew_expense: Money) -> FinancialSummary {
    let total_expense_with_crew = totals.expense + crew_expense;
    FinancialSummary {
        total_income: totals.income_received,
        total_expense: totals.expense,
        crew_expense,
        total_expense_with_crew,
        pending_ar: totals.income_pending,
        net_profit: totals.income_received - total_expense_with_crew,
    }
}

/// Return on investment as a percentage with two decimals; 0 for no investment.
pub fn roi_percentage(net_profit: Money, investment: Money) -> Money {
    if investment <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (net_profit / investment * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Share of the budget already spent, as a whole percentage.
pub fn burn_rate(expense: Money, budget: Money) -> i64 {
    if budget <= Decimal::ZERO {
        return 0;
    }
    (expense / budget * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(i64::MAX)
}

/// Spending pace relative to production progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BudgetHealth {
    Overbudget,
    Efficient,
}

/// A project is over budget when it has burned a larger share of its budget
/// than the share of milestones it has completed.
pub fn budget_health(burn_rate: i64, progress: u8) -> BudgetHealth {
    if burn_rate > i64::from(progress) {
        BudgetHealth::Overbudget
    } else {
        BudgetHealth::Efficient
    }
}

/// Parse a `YYYY-MM` month filter into its first and last calendar day.
pub fn month_range(month: &str) -> Result<(NaiveDate, NaiveDate), CoreError> {
    let invalid = || CoreError::Validation(format!("Invalid month '{month}'. Expected YYYY-MM"));

    let (year, mon) = month.split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let mon: u32 = mon.parse().map_err(|_| invalid())?;

    let first = NaiveDate::from_ymd_opt(year, mon, 1).ok_or_else(invalid)?;
    let next_month = if first.month() == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, mon + 1, 1)
    }
    .ok_or_else(invalid)?;
    let last = next_month.pred_opt().ok_or_else(invalid)?;

    Ok((first, last))
}
