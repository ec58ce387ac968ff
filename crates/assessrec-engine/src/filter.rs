use serde::Serialize;
use tracing::{debug, warn};

use assessrec_core::types::Candidate;

/// A duration bound that was detected but not applied because too few
/// candidates satisfied it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Relaxation {
    pub constraint: u32,
    /// Candidates that did fit the bound.
    pub kept: usize,
}

#[derive(Debug, Clone)]
pub struct FilterOutcome<'a> {
    pub candidates: Vec<Candidate<'a>>,
    pub relaxation: Option<Relaxation>,
}

/// Keep candidates whose duration is unknown or within `constraint`, unless
/// that leaves fewer than `min_results`; then the input is returned whole.
pub fn apply_duration<'a>(candidates: Vec<Candidate<'a>>, constraint: Option<u32>, min_results: usize) -> FilterOutcome<'a> {
    let Some(max_minutes) = constraint else {
        return FilterOutcome { candidates, relaxation: None };
    };
    let kept: Vec<Candidate<'a>> = candidates.iter().copied().filter(|c| c.item.fits_duration(max_minutes)).collect();
    if kept.len() >= min_results {
        debug!(constraint = max_minutes, before = candidates.len(), after = kept.len(), "duration filter applied");
        return FilterOutcome { candidates: kept, relaxation: None };
    }
    warn!(constraint = max_minutes, kept = kept.len(), min_results, "too few assessments fit the duration limit; ignoring it");
    FilterOutcome { candidates, relaxation: Some(Relaxation { constraint: max_minutes, kept: kept.len() }) }
}
