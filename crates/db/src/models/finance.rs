//! Finance transaction model and DTOs.

use dreamlight_core::types::{Date, DbId, Money, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A finance row from the `finances` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Finance {
    pub id: DbId,
    pub project_id: DbId,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub finance_type: String,
    pub category: String,
    pub amount: Money,
    pub transaction_date: Date,
    pub description: Option<String>,
    pub status: String,
    /// Set only on the expense row recorded by a crew honor payout.
    pub milestone_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A finance row with its project title.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FinanceDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub finance: Finance,
    pub project_title: String,
}

/// DTO for creating a new finance transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFinance {
    pub project_id: DbId,
    #[serde(rename = "type")]
    pub finance_type: String,
    pub category: String,
    pub amount: Money,
    /// Defaults to today if omitted.
    pub transaction_date: Option<Date>,
    pub description: Option<String>,
    /// Defaults to `Pending` if omitted.
    pub status: Option<String>,
}

/// DTO for updating an existing finance transaction. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFinance {
    #[serde(rename = "type")]
    pub finance_type: Option<String>,
    pub category: Option<String>,
    pub amount: Option<Money>,
    pub transaction_date: Option<Date>,
    pub description: Option<String>,
    pub status: Option<String>,
}

/// Filters for the finance list. The date range comes from a `YYYY-MM` month.
#[derive(Debug, Clone, Default)]
pub struct FinanceListFilter {
    pub project_id: Option<DbId>,
    pub finance_type: Option<String>,
    pub status: Option<String>,
    pub from: Option<Date>,
    pub to: Option<Date>,
}

/// A finished, unpaid milestone awaiting payment.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PendingPayroll {
    pub milestone_id: DbId,
    pub task_name: String,
    pub phase_category: String,
    pub honor_amount: Money,
    pub project_id: DbId,
    pub project_title: String,
    pub user_id: DbId,
    pub user_name: String,
    pub updated_at: Timestamp,
}

/// Finance and paid-honor totals for one project.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct ProjectFinanceTotals {
    pub project_id: DbId,
    /// `Expense` rows, excluding payout rows of still-paid milestones.
    pub expense: Money,
    pub income_received: Money,
    pub income_pending: Money,
    /// Honors of paid milestones.
    pub crew_paid: Money,
}
