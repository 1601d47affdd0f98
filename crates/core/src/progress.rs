//! Per-phase progress aggregation over milestones.
//!
//! The database returns one [`PhaseCount`] row per phase from a single
//! grouped query; this module turns those rows into percentages.

use serde::Serialize;

use crate::production::{PHASE_POST_PRODUCTION, PHASE_PRE_PRODUCTION, PHASE_PRODUCTION};

/// Milestone counts for one phase of a project or episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseCount {
    pub phase_category: String,
    pub total: i64,
    pub done: i64,
}

/// Percentage of milestones marked `Done` per reported phase.
///
/// The `Master` phase is tracked on milestones but not reported here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressStats {
    #[serde(rename = "Pre-Production")]
    pub pre_production: u8,
    #[serde(rename = "Production")]
    pub production: u8,
    #[serde(rename = "Post-Production")]
    pub post_production: u8,
}

/// Round `done / total` to a whole percentage; 0 when there is nothing to do.
pub fn completion_rate(done: i64, total: i64) -> u8 {
    if total <= 0 {
        return 0;
    }
    let done = done.clamp(0, total);
    ((done as f64 / total as f64) * 100.0).round() as u8
}

/// Build [`ProgressStats`] from grouped phase counts.
///
/// Unknown phases and `Master` are ignored; missing phases stay at 0.
pub fn compute_progress_stats(rows: &[PhaseCount]) -> ProgressStats {
    let mut stats = ProgressStats::default();
    for row in rows {
        let pct = completion_rate(row.done, row.total);
        match row.phase_category.as_str() {
            PHASE_PRE_PRODUCTION => stats.pre_production = pct,
            PHASE_PRODUCTION => stats.production = pct,
            PHASE_POST_PRODUCTION => stats.post_production = pct,
            _ => {}
        }
    }
    stats
}

/// Overall completion across every phase (including `Master`).
pub fn overall_progress(rows: &[PhaseCount]) -> u8 {
    let total: i64 = rows.iter().map(|r| r.total).sum();
    let done: i64 = rows.iter().map(|r| r.done).sum();
    completion_rate(done, total)
}
