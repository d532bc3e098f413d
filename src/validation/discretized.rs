use crate::collision::CollisionCheckerPtr;
use crate::foundation::core::zeros;
use crate::foundation::error::KinoResult;
use crate::path::{Path, PathPtr};
use crate::validation::{
    CancelToken, PathValidation, ScanOutcome, ValidationReport, ValidationSettings, finish, probe,
};

/// Samples the path every `settings.step` and accepts it when every sample is free.
///
/// Nothing between samples is certified: obstacles thinner than the robot motion over one step
/// can be missed.
pub struct DiscretizedValidation {
    checker: CollisionCheckerPtr,
    settings: ValidationSettings,
    cancel: Option<CancelToken>,
}

impl DiscretizedValidation {
    pub fn new(checker: CollisionCheckerPtr, settings: ValidationSettings) -> KinoResult<Self> {
        settings.validate()?;
        Ok(Self {
            checker,
            settings,
            cancel: None,
        })
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn scan(&self, path: &dyn Path, reverse: bool) -> ScanOutcome {
        let range = path.time_range();
        let (from, to) = if reverse {
            (range.end, range.start)
        } else {
            (range.start, range.end)
        };
        let dir = if reverse { -1.0 } else { 1.0 };
        let step = self.settings.step;
        let samples = (range.length() / step).ceil() as usize;
        let mut q = zeros(path.output_size());

        let mut reached = None;
        let mut checks = 0;
        for k in 0..=samples {
            if checks >= self.settings.max_checks
                || self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
            {
                return ScanOutcome {
                    reached,
                    collision_at: None,
                    checks,
                    interrupted: true,
                    uncertified: false,
                };
            }
            let t = if k == samples {
                to
            } else {
                from + dir * step * k as f64
            };
            checks += 1;
            if !probe(self.checker.as_ref(), path, t, &mut q).is_free() {
                return ScanOutcome {
                    reached,
                    collision_at: Some(t),
                    checks,
                    interrupted: false,
                    uncertified: false,
                };
            }
            reached = Some(t);
        }
        ScanOutcome {
            reached,
            collision_at: None,
            checks,
            interrupted: false,
            uncertified: false,
        }
    }
}

impl PathValidation for DiscretizedValidation {
    #[tracing::instrument(level = "debug", skip(self, path), fields(range = %path.time_range()))]
    fn validate(&self, path: &PathPtr, reverse: bool) -> KinoResult<ValidationReport> {
        let report = finish(path, reverse, self.scan(path.as_ref(), reverse))?;
        tracing::debug!(
            whole_valid = report.whole_valid,
            certified = %report.certified,
            checks = report.checks,
            "discretized validation done"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/validation/discretized.rs"]
mod tests;
