use crate::collision::{CollisionCheckerPtr, CollisionQuery};
use crate::foundation::core::zeros;
use crate::foundation::error::KinoResult;
use crate::path::{Path, PathPtr};
use crate::validation::{
    CancelToken, PathValidation, ScanOutcome, ValidationReport, ValidationSettings, finish, probe,
};

/// Certified continuous validation.
///
/// Starting from a valid boundary configuration with clearance `d`, the path cannot reach an
/// obstacle before the robot has moved `d` in the workspace. With a per-DOF velocity bound `v`
/// over the look-ahead window and Lipschitz weights `λ`, the workspace speed is at most
/// `σ = Σ λ_i v_i`, so the interval `[t, t + d / σ]` is collision free. Each step therefore
/// certifies a whole interval; only its far end needs testing.
///
/// A positive `tolerance` rounds clearance up to it and then only certifies the path up to a
/// penetration of `tolerance`; the default of zero keeps the certificate exact.
///
/// Positive clearance always yields a certified step, however short; the check budget bounds
/// the cost of creeping towards a contact. When no certified progress is possible (the checker
/// reports no clearance, or the step vanishes below floating-point resolution) the scan keeps
/// going with `min_step` samples so that a collision ahead can still be located, but the
/// certified interval ends where sampling began and the report is marked `uncertified`.
pub struct ContinuousValidation {
    checker: CollisionCheckerPtr,
    settings: ValidationSettings,
    cancel: Option<CancelToken>,
}

impl ContinuousValidation {
    pub fn new(checker: CollisionCheckerPtr, settings: ValidationSettings) -> KinoResult<Self> {
        settings.validate()?;
        Ok(Self {
            checker,
            settings,
            cancel: None,
        })
    }

    /// Stop scans early once `token` is cancelled.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn settings(&self) -> &ValidationSettings {
        &self.settings
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    fn scan(&self, path: &dyn Path, reverse: bool) -> KinoResult<ScanOutcome> {
        let s = &self.settings;
        let range = path.time_range();
        let (from, to) = if reverse {
            (range.end, range.start)
        } else {
            (range.start, range.end)
        };
        let dir = if reverse { -1.0 } else { 1.0 };
        let mut q = zeros(path.output_size());
        let mut v = zeros(path.output_derivative_size());

        let mut checks = 1;
        let mut query = probe(self.checker.as_ref(), path, from, &mut q);
        if query == CollisionQuery::Collision {
            tracing::debug!(t = from, "boundary configuration is invalid");
            return Ok(ScanOutcome {
                reached: None,
                collision_at: Some(from),
                checks,
                interrupted: false,
                uncertified: false,
            });
        }

        // Every probe up to `committed` was free; certification may have stopped earlier.
        let mut committed = from;
        let mut certified_until = None;
        let mut interrupted = false;
        let mut collision_at = None;
        while committed != to {
            if checks >= s.max_checks || self.cancelled() {
                interrupted = true;
                break;
            }
            let remaining = (to - committed).abs();
            let h = s.max_step.min(remaining);
            let (a, b) = if reverse {
                (committed - h, committed)
            } else {
                (committed, committed + h)
            };
            path.velocity_bound_into(a, b, &mut v)?;
            let sigma = s.workspace_speed(&v)?;
            let reach = query.clearance().unwrap_or(0.0).max(s.tolerance);
            let certified = if sigma > 0.0 { h.min(reach / sigma) } else { h };
            let progresses = certified >= remaining || committed + dir * certified != committed;
            let dt = if progresses {
                certified
            } else {
                if certified_until.is_none() {
                    tracing::debug!(t = committed, reach, sigma, "certified step collapsed");
                    certified_until = Some(committed);
                }
                s.min_step
            };
            let far = if dt >= remaining {
                to
            } else {
                committed + dir * dt
            };

            checks += 1;
            let next = probe(self.checker.as_ref(), path, far, &mut q);
            tracing::trace!(committed, far, sigma, free = next.is_free(), "step");
            if next.is_free() {
                committed = far;
                query = next;
                continue;
            }

            // Localize the first collision between the last free boundary and `far`.
            let (mut free, mut hit) = (committed, far);
            while (hit - free).abs() > s.refinement {
                let mid = 0.5 * (free + hit);
                checks += 1;
                if probe(self.checker.as_ref(), path, mid, &mut q).is_free() {
                    free = mid;
                } else {
                    hit = mid;
                }
            }
            collision_at = Some(hit);
            break;
        }

        Ok(ScanOutcome {
            reached: Some(certified_until.unwrap_or(committed)),
            collision_at,
            checks,
            interrupted,
            uncertified: certified_until.is_some(),
        })
    }
}

impl PathValidation for ContinuousValidation {
    #[tracing::instrument(level = "debug", skip(self, path), fields(range = %path.time_range()))]
    fn validate(&self, path: &PathPtr, reverse: bool) -> KinoResult<ValidationReport> {
        let outcome = self.scan(path.as_ref(), reverse)?;
        let report = finish(path, reverse, outcome)?;
        tracing::debug!(
            whole_valid = report.whole_valid,
            certified = %report.certified,
            checks = report.checks,
            interrupted = report.interrupted,
            uncertified = report.uncertified,
            "continuous validation done"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/validation/continuous.rs"]
mod tests;
