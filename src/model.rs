//! Best-location model - the arbitration policy and its running state.
//!
//! # Selection Logic
//!
//! Evaluated in order, first matching rule decides:
//!
//! 1. No current best - accept anything
//! 2. More than two minutes newer - accept (the user has likely moved)
//! 3. More than two minutes older - reject
//! 4. More accurate - accept
//! 5. Newer and not less accurate - accept
//! 6. Newer, only mildly less accurate, same lineage - accept
//!
//! Recency alone cannot dominate because satellite fixes arrive noisier
//! right after a cold start; accuracy alone cannot dominate because a stale
//! precise fix must eventually be superseded. The two-minute escape hatch
//! bounds how long any held fix can outlive fresher data.

use crate::state::LocationSample;

/// Time delta beyond which a candidate is significantly newer/older (2 min).
pub const SIGNIFICANT_TIME_DELTA_MS: i64 = 1000 * 60 * 2;

/// Accuracy loss (meters, integer-truncated) beyond which a same-lineage
/// candidate no longer wins on recency alone.
pub const SIGNIFICANT_ACCURACY_LOSS: i32 = 200;

/// Decide whether `candidate` should replace `current_best`.
///
/// Pure and total: any two samples produce a deterministic verdict, and an
/// absent current best always accepts. Malformed candidates are compared
/// as-is - validation is the producer's concern.
///
/// The accuracy delta is truncated to an integer before thresholding,
/// matching the historical behavior this policy is compatible with.
pub fn is_better_fix(candidate: &LocationSample, current_best: Option<&LocationSample>) -> bool {
    let Some(best) = current_best else {
        // A new fix is always better than no fix.
        return true;
    };

    let time_delta = candidate.time - best.time;
    let significantly_newer = time_delta > SIGNIFICANT_TIME_DELTA_MS;
    let significantly_older = time_delta < -SIGNIFICANT_TIME_DELTA_MS;
    let newer = time_delta > 0;

    if significantly_newer {
        return true;
    }
    if significantly_older {
        return false;
    }

    // Truncation toward zero is deliberate; see SIGNIFICANT_ACCURACY_LOSS.
    let accuracy_delta = (candidate.accuracy - best.accuracy) as i32;
    let less_accurate = accuracy_delta > 0;
    let more_accurate = accuracy_delta < 0;
    let significantly_less_accurate = accuracy_delta > SIGNIFICANT_ACCURACY_LOSS;

    let same_source = candidate.source == best.source;

    if more_accurate {
        return true;
    }
    if newer && !less_accurate {
        return true;
    }
    if newer && !significantly_less_accurate && same_source {
        return true;
    }

    false
}

/// Running "current best" state for one arbitration session.
///
/// The model holds the most recently *accepted* sample - rejected samples
/// leave it untouched, so the held value is not necessarily the most
/// recently received one.
#[derive(Debug, Default)]
pub struct BestLocationModel {
    current: Option<LocationSample>,
}

impl BestLocationModel {
    /// Create an empty model (no fix held).
    pub fn new() -> Self {
        Self { current: None }
    }

    /// Get the currently held best fix (if any).
    pub fn current(&self) -> Option<&LocationSample> {
        self.current.as_ref()
    }

    /// Check whether any fix has been accepted yet.
    pub fn has_fix(&self) -> bool {
        self.current.is_some()
    }

    /// Would this candidate replace the current best?
    pub fn should_accept(&self, candidate: &LocationSample) -> bool {
        is_better_fix(candidate, self.current.as_ref())
    }

    /// Apply a candidate to the model.
    ///
    /// Returns true if the candidate was accepted and now is the best fix.
    pub fn apply_update(&mut self, candidate: LocationSample) -> bool {
        if self.should_accept(&candidate) {
            self.current = Some(candidate);
            true
        } else {
            false
        }
    }
}
