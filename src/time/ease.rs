/// Monotone easing curve on `[0, 1]`.
///
/// Every variant maps `0 -> 0` and `1 -> 1`, is non-decreasing, and has a unimodal derivative,
/// which is what makes [`Ease::derivative_bound`] exact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
        }
    }

    /// First derivative of [`Ease::apply`]. Zero outside `[0, 1]`, where `apply` is clamped.
    pub fn derivative(self, t: f64) -> f64 {
        if !(0.0..=1.0).contains(&t) {
            return 0.0;
        }
        match self {
            Self::Linear => 1.0,
            Self::InQuad => 2.0 * t,
            Self::OutQuad => 2.0 * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    4.0 * t
                } else {
                    4.0 * (1.0 - t)
                }
            }
            Self::InCubic => 3.0 * t * t,
            Self::OutCubic => 3.0 * (1.0 - t) * (1.0 - t),
            Self::InOutCubic => {
                if t < 0.5 {
                    12.0 * t * t
                } else {
                    12.0 * (1.0 - t) * (1.0 - t)
                }
            }
        }
    }

    /// Location of the derivative maximum on `[0, 1]`.
    fn peak(self) -> f64 {
        match self {
            Self::Linear | Self::OutQuad | Self::OutCubic => 0.0,
            Self::InQuad | Self::InCubic => 1.0,
            Self::InOutQuad | Self::InOutCubic => 0.5,
        }
    }

    /// Supremum of `|derivative|` on `[t0, t1]`.
    pub fn derivative_bound(self, t0: f64, t1: f64) -> f64 {
        let a = t0.clamp(0.0, 1.0);
        let b = t1.clamp(0.0, 1.0);
        if t1 < 0.0 || t0 > 1.0 {
            return 0.0;
        }
        self.derivative(self.peak().clamp(a, b))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/time/ease.rs"]
mod tests;
