//! Repository for the `finances` table, including crew honor payouts.

use chrono::Utc;
use dreamlight_core::access::ProjectScopeBinds;
use dreamlight_core::finance::{crew_honor_category, crew_honor_description, FinanceTotals};
use dreamlight_core::production::{
    FINANCE_STATUS_PAID, FINANCE_STATUS_PENDING, FINANCE_STATUS_RECEIVED, FINANCE_TYPE_EXPENSE,
    FINANCE_TYPE_INCOME, PAYMENT_STATUS_PAID, PAYMENT_STATUS_UNPAID, WORK_STATUS_DONE,
};
use dreamlight_core::types::{DbId, Money};
use sqlx::{FromRow, PgPool};

use super::milestone_repo::COLUMNS as MILESTONE_COLUMNS;
use super::PROJECT_SCOPE;
use crate::models::finance::{
    CreateFinance, Finance, FinanceDetail, FinanceListFilter, PendingPayroll,
    ProjectFinanceTotals, UpdateFinance,
};
use crate::models::milestone::Milestone;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_id, type, category, amount, transaction_date, \
                       description, status, milestone_id, created_at, updated_at";

/// Excludes the honor payout rows of milestones that are still `Paid`; those
/// honors are counted once through the milestones themselves. `$6` is the
/// paid payment status.
const NOT_MIRRORED_HONOR: &str = "NOT EXISTS (SELECT 1 FROM milestones hm \
     WHERE hm.id = f.milestone_id AND hm.payment_status = $6)";

/// Filter predicate for [`FinanceListFilter`], bound after the scope as `$5`..`$9`.
const LIST_FILTER: &str = "($5::BIGINT IS NULL OR f.project_id = $5) \
     AND ($6::TEXT IS NULL OR f.type = $6) \
     AND ($7::TEXT IS NULL OR f.status = $7) \
     AND ($8::DATE IS NULL OR f.transaction_date >= $8) \
     AND ($9::DATE IS NULL OR f.transaction_date <= $9)";

/// Result of [`FinanceRepo::pay_crew`].
#[derive(Debug)]
pub enum PayCrewOutcome {
    NotFound,
    AlreadyPaid,
    Paid {
        milestone: Milestone,
        finance: Finance,
    },
}

#[derive(FromRow)]
struct TotalsRow {
    expense: Money,
    income_received: Money,
    income_pending: Money,
    crew_paid: Money,
}

#[derive(FromRow)]
struct PayeeRow {
    payment_status: String,
    user_name: String,
    project_title: String,
    task_name: String,
    honor_amount: Money,
    project_id: DbId,
}

/// Provides CRUD and aggregate queries for finance transactions.
pub struct FinanceRepo;

impl FinanceRepo {
    /// Insert a new transaction, returning the created row.
    ///
    /// `transaction_date` defaults to today and `status` to `Pending`.
    pub async fn create(pool: &PgPool, input: &CreateFinance) -> Result<Finance, sqlx::Error> {
        let query = format!(
            "INSERT INTO finances (project_id, type, category, amount, transaction_date, description, status)
             VALUES ($1, $2, $3, $4, COALESCE($5, CURRENT_DATE), $6, COALESCE($7, 'Pending'))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Finance>(&query)
            .bind(input.project_id)
            .bind(&input.finance_type)
            .bind(&input.category)
            .bind(input.amount)
            .bind(input.transaction_date)
            .bind(&input.description)
            .bind(&input.status)
            .fetch_one(pool)
            .await
    }

    /// Find a transaction by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Finance>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM finances WHERE id = $1");
        sqlx::query_as::<_, Finance>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List transactions on projects visible under `scope`, latest date first.
    pub async fn list(
        pool: &PgPool,
        scope: &ProjectScopeBinds,
        filter: &FinanceListFilter,
    ) -> Result<Vec<FinanceDetail>, sqlx::Error> {
        let query = format!(
            "SELECT f.id, f.project_id, f.type, f.category, f.amount, f.transaction_date,
                    f.description, f.status, f.milestone_id, f.created_at, f.updated_at,
                    p.title AS project_title
             FROM finances f
             JOIN projects p ON p.id = f.project_id
             WHERE {PROJECT_SCOPE} AND {LIST_FILTER}
             ORDER BY f.transaction_date DESC, f.id DESC"
        );
        sqlx::query_as::<_, FinanceDetail>(&query)
            .bind(scope.producer_id)
            .bind(scope.client_id)
            .bind(scope.investor_id)
            .bind(scope.crew_user_id)
            .bind(filter.project_id)
            .bind(&filter.finance_type)
            .bind(&filter.status)
            .bind(filter.from)
            .bind(filter.to)
            .fetch_all(pool)
            .await
    }

    /// Finance transactions of one project, latest date first.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<Finance>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM finances
             WHERE project_id = $1
             ORDER BY transaction_date DESC, id DESC"
        );
        sqlx::query_as::<_, Finance>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Update a transaction. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateFinance,
    ) -> Result<Option<Finance>, sqlx::Error> {
        let query = format!(
            "UPDATE finances SET
                type = COALESCE($2, type),
                category = COALESCE($3, category),
                amount = COALESCE($4, amount),
                transaction_date = COALESCE($5, transaction_date),
                description = COALESCE($6, description),
                status = COALESCE($7, status)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Finance>(&query)
            .bind(id)
            .bind(&input.finance_type)
            .bind(&input.category)
            .bind(input.amount)
            .bind(input.transaction_date)
            .bind(&input.description)
            .bind(&input.status)
            .fetch_optional(pool)
            .await
    }

    /// Delete a transaction. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM finances WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Transaction totals and paid crew honors over a set of projects.
    ///
    /// Expense rows recorded by [`Self::pay_crew`] are left out of `expense`
    /// while their milestone is still paid; the honors they mirror are
    /// returned as the second element. Once the milestone is gone or reset
    /// to unpaid, its payout row counts as an ordinary expense.
    pub async fn totals(
        pool: &PgPool,
        project_ids: &[DbId],
    ) -> Result<(FinanceTotals, Money), sqlx::Error> {
        let query = format!(
            "SELECT
                COALESCE((SELECT SUM(f.amount) FROM finances f
                          WHERE f.project_id = ANY($1) AND f.type = $2
                            AND {NOT_MIRRORED_HONOR}), 0) AS expense,
                COALESCE((SELECT SUM(amount) FROM finances
                          WHERE project_id = ANY($1) AND type = $3 AND status = $4), 0)
                    AS income_received,
                COALESCE((SELECT SUM(amount) FROM finances
                          WHERE project_id = ANY($1) AND type = $3 AND status = $5), 0)
                    AS income_pending,
                COALESCE((SELECT SUM(honor_amount) FROM milestones
                          WHERE project_id = ANY($1) AND payment_status = $6), 0) AS crew_paid"
        );
        let row = sqlx::query_as::<_, TotalsRow>(&query)
            .bind(project_ids)
            .bind(FINANCE_TYPE_EXPENSE)
            .bind(FINANCE_TYPE_INCOME)
            .bind(FINANCE_STATUS_RECEIVED)
            .bind(FINANCE_STATUS_PENDING)
            .bind(PAYMENT_STATUS_PAID)
            .fetch_one(pool)
            .await?;

        let totals = FinanceTotals {
            expense: row.expense,
            income_received: row.income_received,
            income_pending: row.income_pending,
        };
        Ok((totals, row.crew_paid))
    }

    /// The same totals as [`Self::totals`], broken down per project.
    ///
    /// Every id in `project_ids` gets a row, zeroed when it has no data.
    pub async fn totals_by_project(
        pool: &PgPool,
        project_ids: &[DbId],
    ) -> Result<Vec<ProjectFinanceTotals>, sqlx::Error> {
        let query = format!(
            "SELECT ids.project_id,
                COALESCE((SELECT SUM(f.amount) FROM finances f
                          WHERE f.project_id = ids.project_id AND f.type = $2
                            AND {NOT_MIRRORED_HONOR}), 0) AS expense,
                COALESCE((SELECT SUM(amount) FROM finances f
                          WHERE f.project_id = ids.project_id AND f.type = $3 AND f.status = $4), 0)
                    AS income_received,
                COALESCE((SELECT SUM(amount) FROM finances f
                          WHERE f.project_id = ids.project_id AND f.type = $3 AND f.status = $5), 0)
                    AS income_pending,
                COALESCE((SELECT SUM(honor_amount) FROM milestones m
                          WHERE m.project_id = ids.project_id AND m.payment_status = $6), 0)
                    AS crew_paid
             FROM UNNEST($1::BIGINT[]) AS ids(project_id)
             ORDER BY ids.project_id"
        );
        sqlx::query_as::<_, ProjectFinanceTotals>(&query)
            .bind(project_ids)
            .bind(FINANCE_TYPE_EXPENSE)
            .bind(FINANCE_TYPE_INCOME)
            .bind(FINANCE_STATUS_RECEIVED)
            .bind(FINANCE_STATUS_PENDING)
            .bind(PAYMENT_STATUS_PAID)
            .fetch_all(pool)
            .await
    }

    /// Finished but unpaid milestones on projects visible under `scope`.
    pub async fn pending_payroll(
        pool: &PgPool,
        scope: &ProjectScopeBinds,
    ) -> Result<Vec<PendingPayroll>, sqlx::Error> {
        let query = format!(
            "SELECT m.id AS milestone_id, m.task_name, m.phase_category, m.honor_amount,
                    m.project_id, p.title AS project_title,
                    m.user_id, u.name AS user_name, m.updated_at
             FROM milestones m
             JOIN projects p ON p.id = m.project_id
             JOIN users u ON u.id = m.user_id
             WHERE {PROJECT_SCOPE} AND m.work_status = $5 AND m.payment_status = $6
             ORDER BY m.updated_at ASC, m.id"
        );
        sqlx::query_as::<_, PendingPayroll>(&query)
            .bind(scope.producer_id)
            .bind(scope.client_id)
            .bind(scope.investor_id)
            .bind(scope.crew_user_id)
            .bind(WORK_STATUS_DONE)
            .bind(PAYMENT_STATUS_UNPAID)
            .fetch_all(pool)
            .await
    }

    /// Pay a crew honor: mark the milestone `Paid` and record a matching
    /// `Expense` row, both in one transaction.
    ///
    /// The milestone row is locked for the duration so concurrent payouts
    /// cannot both succeed.
    pub async fn pay_crew(pool: &PgPool, milestone_id: DbId) -> Result<PayCrewOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let payee = sqlx::query_as::<_, PayeeRow>(
            "SELECT m.payment_status, u.name AS user_name, p.title AS project_title,
                    m.task_name, m.honor_amount, m.project_id
             FROM milestones m
             JOIN users u ON u.id = m.user_id
             JOIN projects p ON p.id = m.project_id
             WHERE m.id = $1
             FOR UPDATE OF m",
        )
        .bind(milestone_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(payee) = payee else {
            return Ok(PayCrewOutcome::NotFound);
        };
        if payee.payment_status == PAYMENT_STATUS_PAID {
            return Ok(PayCrewOutcome::AlreadyPaid);
        }

        let milestone_query = format!(
            "UPDATE milestones SET payment_status = $2 WHERE id = $1 RETURNING {MILESTONE_COLUMNS}"
        );
        let milestone = sqlx::query_as::<_, Milestone>(&milestone_query)
            .bind(milestone_id)
            .bind(PAYMENT_STATUS_PAID)
            .fetch_one(&mut *tx)
            .await?;

        let finance_query = format!(
            "INSERT INTO finances
                (project_id, type, category, amount, transaction_date, description, status, milestone_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        let finance = sqlx::query_as::<_, Finance>(&finance_query)
            .bind(payee.project_id)
            .bind(FINANCE_TYPE_EXPENSE)
            .bind(crew_honor_category(&payee.user_name, &payee.task_name))
            .bind(payee.honor_amount)
            .bind(Utc::now().date_naive())
            .bind(crew_honor_description(&payee.task_name, &payee.project_title))
            .bind(FINANCE_STATUS_PAID)
            .bind(milestone_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(milestone_id, finance_id = finance.id, "Crew honor paid");
        Ok(PayCrewOutcome::Paid { milestone, finance })
    }
}
