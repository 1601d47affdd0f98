//! Production vocabularies: project types and statuses, episode statuses,
//! milestone phases/work/payment states, finance kinds, and asset categories.
//!
//! Values are stored verbatim in `TEXT` columns guarded by CHECK
//! constraints, so every constant here must match the migrations exactly.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

pub const PROJECT_TYPE_MOVIE: &str = "Movie";
pub const PROJECT_TYPE_SERIES: &str = "Series";
pub const PROJECT_TYPE_EVENT: &str = "Event";
pub const PROJECT_TYPE_TVC: &str = "TVC";

pub const VALID_PROJECT_TYPES: &[&str] = &[
    PROJECT_TYPE_MOVIE,
    PROJECT_TYPE_SERIES,
    PROJECT_TYPE_EVENT,
    PROJECT_TYPE_TVC,
];

pub const PROJECT_STATUS_DRAFT: &str = "Draft";
pub const PROJECT_STATUS_IN_PROGRESS: &str = "In Progress";
pub const PROJECT_STATUS_COMPLETED: &str = "Completed";
pub const PROJECT_STATUS_ON_HOLD: &str = "On Hold";

pub const VALID_PROJECT_STATUSES: &[&str] = &[
    PROJECT_STATUS_DRAFT,
    PROJECT_STATUS_IN_PROGRESS,
    PROJECT_STATUS_COMPLETED,
    PROJECT_STATUS_ON_HOLD,
];

/// Display name used when a project has no client.
pub const DEFAULT_CLIENT_NAME: &str = "Internal Project";
/// Display name used when a project has no investor.
pub const DEFAULT_INVESTOR_NAME: &str = "Internal Funding";

// ---------------------------------------------------------------------------
// Episodes
// ---------------------------------------------------------------------------

pub const EPISODE_STATUS_SCRIPTING: &str = "Scripting";
pub const EPISODE_STATUS_FILMING: &str = "Filming";
pub const EPISODE_STATUS_EDITING: &str = "Editing";
pub const EPISODE_STATUS_PREVIEW_READY: &str = "Preview Ready";
pub const EPISODE_STATUS_MASTER_READY: &str = "Master Ready";

pub const VALID_EPISODE_STATUSES: &[&str] = &[
    EPISODE_STATUS_SCRIPTING,
    EPISODE_STATUS_FILMING,
    EPISODE_STATUS_EDITING,
    EPISODE_STATUS_PREVIEW_READY,
    EPISODE_STATUS_MASTER_READY,
];

// ---------------------------------------------------------------------------
// Milestones
// ---------------------------------------------------------------------------

pub const PHASE_PRE_PRODUCTION: &str = "Pre-Production";
pub const PHASE_PRODUCTION: &str = "Production";
pub const PHASE_POST_PRODUCTION: &str = "Post-Production";
pub const PHASE_MASTER: &str = "Master";

pub const VALID_PHASES: &[&str] = &[
    PHASE_PRE_PRODUCTION,
    PHASE_PRODUCTION,
    PHASE_POST_PRODUCTION,
    PHASE_MASTER,
];

pub const WORK_STATUS_PENDING: &str = "Pending";
pub const WORK_STATUS_IN_PROGRESS: &str = "In Progress";
pub const WORK_STATUS_WAITING_APPROVAL: &str = "Waiting Approval";
pub const WORK_STATUS_DONE: &str = "Done";

pub const VALID_WORK_STATUSES: &[&str] = &[
    WORK_STATUS_PENDING,
    WORK_STATUS_IN_PROGRESS,
    WORK_STATUS_WAITING_APPROVAL,
    WORK_STATUS_DONE,
];

/// Work states that count as "active" (blocking user deletion and crew removal).
pub const ACTIVE_WORK_STATUSES: &[&str] = &[
    WORK_STATUS_PENDING,
    WORK_STATUS_IN_PROGRESS,
    WORK_STATUS_WAITING_APPROVAL,
];

pub const PAYMENT_STATUS_UNPAID: &str = "Unpaid";
pub const PAYMENT_STATUS_PAID: &str = "Paid";

pub const VALID_PAYMENT_STATUSES: &[&str] = &[PAYMENT_STATUS_UNPAID, PAYMENT_STATUS_PAID];

// ---------------------------------------------------------------------------
// Finance
// ---------------------------------------------------------------------------

pub const FINANCE_TYPE_EXPENSE: &str = "Expense";
pub const FINANCE_TYPE_INCOME: &str = "Income";

pub const VALID_FINANCE_TYPES: &[&str] = &[FINANCE_TYPE_EXPENSE, FINANCE_TYPE_INCOME];

pub const FINANCE_STATUS_PAID: &str = "Paid";
pub const FINANCE_STATUS_RECEIVED: &str = "Received";
pub const FINANCE_STATUS_PENDING: &str = "Pending";

pub const VALID_FINANCE_STATUSES: &[&str] = &[
    FINANCE_STATUS_PAID,
    FINANCE_STATUS_RECEIVED,
    FINANCE_STATUS_PENDING,
];

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

pub const ASSET_CATEGORY_SCRIPT: &str = "Script";
pub const ASSET_CATEGORY_CONTRACT: &str = "Contract";
pub const ASSET_CATEGORY_PREVIEW_VIDEO: &str = "Preview Video";
pub const ASSET_CATEGORY_MASTER_VIDEO: &str = "Master Video";
pub const ASSET_CATEGORY_OTHER: &str = "Other";

pub const VALID_ASSET_CATEGORIES: &[&str] = &[
    ASSET_CATEGORY_SCRIPT,
    ASSET_CATEGORY_CONTRACT,
    ASSET_CATEGORY_PREVIEW_VIDEO,
    ASSET_CATEGORY_MASTER_VIDEO,
    ASSET_CATEGORY_OTHER,
];

pub const LINK_TYPE_GOOGLE_DRIVE: &str = "google_drive";
pub const LINK_TYPE_DROPBOX: &str = "dropbox";
pub const LINK_TYPE_YOUTUBE: &str = "youtube";
pub const LINK_TYPE_VIMEO: &str = "vimeo";
pub const LINK_TYPE_ONEDRIVE: &str = "onedrive";
pub const LINK_TYPE_OTHER: &str = "other";

pub const VALID_LINK_TYPES: &[&str] = &[
    LINK_TYPE_GOOGLE_DRIVE,
    LINK_TYPE_DROPBOX,
    LINK_TYPE_YOUTUBE,
    LINK_TYPE_VIMEO,
    LINK_TYPE_ONEDRIVE,
    LINK_TYPE_OTHER,
];

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check that `value` is one of `allowed`, naming `field` in the error.
pub fn validate_one_of(field: &str, value: &str, allowed: &[&str]) -> Result<(), CoreError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid {field} '{value}'. Must be one of: {}",
            allowed.join(", ")
        )))
    }
}

pub fn validate_project_type(value: &str) -> Result<(), CoreError> {
    validate_one_of("project type", value, VALID_PROJECT_TYPES)
}

pub fn validate_project_status(value: &str) -> Result<(), CoreError> {
    validate_one_of("project status", value, VALID_PROJECT_STATUSES)
}

pub fn validate_episode_status(value: &str) -> Result<(), CoreError> {
    validate_one_of("episode status", value, VALID_EPISODE_STATUSES)
}

pub fn validate_phase(value: &str) -> Result<(), CoreError> {
    validate_one_of("phase category", value, VALID_PHASES)
}

pub fn validate_work_status(value: &str) -> Result<(), CoreError> {
    validate_one_of("work status", value, VALID_WORK_STATUSES)
}

pub fn validate_payment_status(value: &str) -> Result<(), CoreError> {
    validate_one_of("payment status", value, VALID_PAYMENT_STATUSES)
}

pub fn validate_finance_type(value: &str) -> Result<(), CoreError> {
    validate_one_of("transaction type", value, VALID_FINANCE_TYPES)
}

pub fn validate_finance_status(value: &str) -> Result<(), CoreError> {
    validate_one_of("transaction status", value, VALID_FINANCE_STATUSES)
}

pub fn validate_asset_category(value: &str) -> Result<(), CoreError> {
    validate_one_of("asset category", value, VALID_ASSET_CATEGORIES)
}

pub fn validate_link_type(value: &str) -> Result<(), CoreError> {
    validate_one_of("link type", value, VALID_LINK_TYPES)
}

/// Whether a milestone in `work_status` still counts as outstanding work.
pub fn is_active_work_status(work_status: &str) -> bool {
    ACTIVE_WORK_STATUSES.contains(&work_status)
}

/// Episodes may only be attached to Series projects.
pub fn ensure_series_project(project_type: &str) -> Result<(), CoreError> {
    if project_type == PROJECT_TYPE_SERIES {
        Ok(())
    } else {
        Err(CoreError::Validation(
            "Episodes can only be created for Series type projects".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn accepts_every_known_value() {
        for v in VALID_PROJECT_TYPES {
            assert!(validate_project_type(v).is_ok());
        }
        for v in VALID_WORK_STATUSES {
            assert!(validate_work_status(v).is_ok());
        }
        for v in VALID_ASSET_CATEGORIES {
            assert!(validate_asset_category(v).is_ok());
        }
    }

    #[test]
    fn rejects_unknown_value_with_field_name() {
        let err = validate_work_status("Finished").unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("work status") && msg.contains("Finished"));
    }

    #[test]
    fn vocabulary_is_case_sensitive() {
        assert!(validate_finance_type("expense").is_err());
        assert!(validate_project_status("in progress").is_err());
    }

    #[test]
    fn done_is_not_active_work() {
        assert!(is_active_work_status(WORK_STATUS_PENDING));
        assert!(is_active_work_status(WORK_STATUS_WAITING_APPROVAL));
        assert!(!is_active_work_status(WORK_STATUS_DONE));
    }

    #[test]
    fn only_series_projects_take_episodes() {
        assert!(ensure_series_project(PROJECT_TYPE_SERIES).is_ok());
        assert_matches!(
            ensure_series_project(PROJECT_TYPE_MOVIE),
            Err(CoreError::Validation(_))
        );
    }
}
