//! Configuration validity oracles.

pub mod planar;

use std::sync::Arc;

/// Outcome of testing one configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CollisionQuery {
    /// Valid. `clearance`, when known, is a lower bound of the workspace distance to the
    /// nearest obstacle.
    Free { clearance: Option<f64> },
    Collision,
}

impl CollisionQuery {
    pub fn is_free(self) -> bool {
        matches!(self, Self::Free { .. })
    }

    pub fn clearance(self) -> Option<f64> {
        match self {
            Self::Free { clearance } => clearance,
            Self::Collision => None,
        }
    }
}

/// Answers whether a configuration is valid. Must be reentrant: validation of different paths
/// may query the same checker from several threads.
pub trait CollisionChecker: Send + Sync {
    fn check(&self, q: &[f64]) -> CollisionQuery;
}

pub type CollisionCheckerPtr = Arc<dyn CollisionChecker>;
