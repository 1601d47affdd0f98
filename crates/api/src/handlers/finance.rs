//! Handlers for the `/finance` resource: transactions, summaries and crew payroll.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use dreamlight_core::access::project_filter_for;
use dreamlight_core::finance::{month_range, summarize, FinancialSummary};
use dreamlight_core::production::{
    validate_finance_status, validate_finance_type, FINANCE_STATUS_RECEIVED, FINANCE_TYPE_EXPENSE,
    FINANCE_TYPE_INCOME,
};
use dreamlight_core::types::{DbId, Money};
use dreamlight_core::validation::{validate_positive_money, validate_required_text, MAX_CATEGORY_LEN};
use dreamlight_db::models::finance::{
    CreateFinance, Finance, FinanceDetail, FinanceListFilter, PendingPayroll, UpdateFinance,
};
use dreamlight_db::models::milestone::Milestone;
use dreamlight_db::repositories::{FinanceRepo, MilestoneRepo, PayCrewOutcome, ProjectRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::access::{ensure_producer_access, ensure_project_access};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireManager};
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct FinanceListParams {
    pub project_id: Option<DbId>,
    #[serde(rename = "type")]
    pub finance_type: Option<String>,
    pub status: Option<String>,
    /// `YYYY-MM`
    pub month: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    pub project_id: Option<DbId>,
}

#[derive(Debug, Deserialize)]
pub struct PayCrewRequest {
    pub milestone_id: Option<DbId>,
}

/// Totals over the rows of a finance listing.
#[derive(Debug, Default, Serialize)]
pub struct ListTotals {
    pub total_expense: Money,
    /// `Income` rows with status `Received`.
    pub total_income: Money,
}

#[derive(Debug, Serialize)]
pub struct FinanceList {
    pub transactions: Vec<FinanceDetail>,
    pub totals: ListTotals,
}

#[derive(Debug, Serialize)]
pub struct PayCrewResult {
    pub milestone: Milestone,
    pub finance: Finance,
}

fn list_totals(rows: &[FinanceDetail]) -> ListTotals {
    rows.iter().fold(ListTotals::default(), |mut acc, row| {
        let f = &row.finance;
        if f.finance_type == FINANCE_TYPE_EXPENSE {
            acc.total_expense += f.amount;
        } else if f.finance_type == FINANCE_TYPE_INCOME && f.status == FINANCE_STATUS_RECEIVED {
            acc.total_income += f.amount;
        }
        acc
    })
}

async fn find_finance(state: &AppState, id: DbId) -> AppResult<Finance> {
    FinanceRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Finance transaction", id))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/finance
pub async fn list(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Query(params): Query<FinanceListParams>,
) -> AppResult<Json<DataResponse<FinanceList>>> {
    let (from, to) = match params.month.as_deref().filter(|m| !m.is_empty()) {
        Some(month) => {
            let (first, last) = month_range(month)?;
            (Some(first), Some(last))
        }
        None => (None, None),
    };
    let filter = FinanceListFilter {
        project_id: params.project_id,
        finance_type: params.finance_type,
        status: params.status,
        from,
        to,
    };
    let scope = project_filter_for(user.user_id, user.role).binds();

    let transactions = FinanceRepo::list(&state.pool, &scope, &filter).await?;
    let totals = list_totals(&transactions);

    Ok(Json(DataResponse {
        data: FinanceList {
            transactions,
            totals,
        },
    }))
}

/// POST /api/v1/finance
pub async fn create(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Json(mut input): Json<CreateFinance>,
) -> AppResult<(StatusCode, Json<DataResponse<Finance>>)> {
    validate_finance_type(&input.finance_type)?;
    validate_required_text("Category", &input.category, MAX_CATEGORY_LEN)?;
    input.category = input.category.trim().to_string();
    validate_positive_money("Amount", input.amount)?;
    if let Some(status) = input.status.as_deref() {
        validate_finance_status(status)?;
    }
    ensure_producer_access(&state.pool, &user, input.project_id).await?;

    let finance = FinanceRepo::create(&state.pool, &input).await?;
    tracing::info!(
        finance_id = finance.id,
        project_id = finance.project_id,
        finance_type = %finance.finance_type,
        amount = %finance.amount,
        "Finance transaction recorded"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: finance })))
}

/// GET /api/v1/finance/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Finance>>> {
    let finance = find_finance(&state, id).await?;
    ensure_producer_access(&state.pool, &user, finance.project_id).await?;
    Ok(Json(DataResponse { data: finance }))
}

/// PUT /api/v1/finance/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateFinance>,
) -> AppResult<Json<DataResponse<Finance>>> {
    let existing = find_finance(&state, id).await?;
    ensure_producer_access(&state.pool, &user, existing.project_id).await?;

    if let Some(finance_type) = input.finance_type.as_deref() {
        validate_finance_type(finance_type)?;
    }
    if let Some(category) = input.category.as_mut() {
        validate_required_text("Category", category, MAX_CATEGORY_LEN)?;
        *category = category.trim().to_string();
    }
    if let Some(amount) = input.amount {
        validate_positive_money("Amount", amount)?;
    }
    if let Some(status) = input.status.as_deref() {
        validate_finance_status(status)?;
    }

    let finance = FinanceRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("Finance transaction", id))?;
    tracing::info!(finance_id = id, updated_by = user.user_id, "Finance transaction updated");

    Ok(Json(DataResponse { data: finance }))
}

/// DELETE /api/v1/finance/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<MessageResponse>>> {
    if !FinanceRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found("Finance transaction", id));
    }
    tracing::info!(finance_id = id, deleted_by = admin.user_id, "Finance transaction deleted");

    Ok(Json(DataResponse {
        data: MessageResponse::new("Finance transaction deleted successfully"),
    }))
}

/// GET /api/v1/finance/summary?project_id=
///
/// Income, expense (transactions plus paid crew honors), receivables and net
/// profit, over one project or every project visible to the caller.
pub async fn summary(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<SummaryParams>,
) -> AppResult<Json<DataResponse<FinancialSummary>>> {
    let project_ids = match params.project_id {
        Some(project_id) => {
            ensure_project_access(&state.pool, &user, project_id).await?;
            vec![project_id]
        }
        None => {
            let scope = project_filter_for(user.user_id, user.role).binds();
            ProjectRepo::scoped_ids(&state.pool, &scope).await?
        }
    };

    let (totals, crew_paid) = FinanceRepo::totals(&state.pool, &project_ids).await?;
    Ok(Json(DataResponse {
        data: summarize(totals, crew_paid),
    }))
}

/// GET /api/v1/finance/payroll/pending
///
/// Finished milestones whose honor has not been paid yet.
pub async fn pending_payroll(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
) -> AppResult<Json<DataResponse<Vec<PendingPayroll>>>> {
    let scope = project_filter_for(user.user_id, user.role).binds();
    let rows = FinanceRepo::pending_payroll(&state.pool, &scope).await?;
    Ok(Json(DataResponse { data: rows }))
}

/// POST /api/v1/finance/pay-crew
///
/// Marks the milestone's honor paid and records the matching `Expense` row
/// in the same transaction.
pub async fn pay_crew(
    State(state): State<AppState>,
    RequireManager(user): RequireManager,
    Json(input): Json<PayCrewRequest>,
) -> AppResult<Json<DataResponse<PayCrewResult>>> {
    let milestone_id = input
        .milestone_id
        .ok_or_else(|| AppError::BadRequest("milestone_id is required".into()))?;
    let milestone = MilestoneRepo::find_by_id(&state.pool, milestone_id)
        .await?
        .ok_or(AppError::not_found("Milestone", milestone_id))?;
    ensure_producer_access(&state.pool, &user, milestone.project_id).await?;

    match FinanceRepo::pay_crew(&state.pool, milestone_id).await? {
        PayCrewOutcome::NotFound => Err(AppError::not_found("Milestone", milestone_id)),
        PayCrewOutcome::AlreadyPaid => Err(AppError::conflict("Honor has already been paid")),
        PayCrewOutcome::Paid { milestone, finance } => {
            tracing::debug!(milestone_id, paid_by = user.user_id, amount = %finance.amount, "Payroll processed");
            Ok(Json(DataResponse {
                data: PayCrewResult { milestone, finance },
            }))
        }
    }
}
