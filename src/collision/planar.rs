use kurbo::{Circle, Point, Rect};

use crate::collision::{CollisionChecker, CollisionQuery};
use crate::foundation::error::{KinoError, KinoResult};

/// Obstacle geometry.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObstacleShape {
    Circle(Circle),
    Rect(Rect),
}

impl ObstacleShape {
    /// Distance from `p` to the shape boundary, negative inside.
    pub fn signed_distance(&self, p: Point) -> f64 {
        match self {
            Self::Circle(c) => (p - c.center).hypot() - c.radius,
            Self::Rect(r) => {
                let dx = (r.x0 - p.x).max(p.x - r.x1);
                let dy = (r.y0 - p.y).max(p.y - r.y1);
                if dx <= 0.0 && dy <= 0.0 {
                    dx.max(dy)
                } else {
                    dx.max(0.0).hypot(dy.max(0.0))
                }
            }
        }
    }

    fn validate(&self) -> KinoResult<()> {
        let ok = match self {
            Self::Circle(c) => c.center.is_finite() && c.radius.is_finite() && c.radius >= 0.0,
            Self::Rect(r) => r.is_finite() && r.x0 <= r.x1 && r.y0 <= r.y1,
        };
        if ok {
            Ok(())
        } else {
            Err(KinoError::validation(format!("malformed obstacle shape {self:?}")))
        }
    }
}

fn enabled() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Obstacle {
    pub name: String,
    pub shape: ObstacleShape,
    /// Contact with this obstacle invalidates a configuration.
    #[serde(default = "enabled")]
    pub collision: bool,
    /// This obstacle takes part in clearance computation.
    #[serde(default = "enabled")]
    pub distance: bool,
}

/// Disc robot translating in the plane among static obstacles.
///
/// The robot center is read from the first two configuration entries; any further entries are
/// ignored by the geometry.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlanarWorld {
    pub robot_radius: f64,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
}

impl PlanarWorld {
    pub fn new(robot_radius: f64) -> KinoResult<Self> {
        let world = Self {
            robot_radius,
            obstacles: Vec::new(),
        };
        world.validate()?;
        Ok(world)
    }

    pub fn add_obstacle(
        &mut self,
        name: impl Into<String>,
        shape: ObstacleShape,
        collision: bool,
        distance: bool,
    ) -> KinoResult<()> {
        shape.validate()?;
        self.obstacles.push(Obstacle {
            name: name.into(),
            shape,
            collision,
            distance,
        });
        Ok(())
    }

    pub fn validate(&self) -> KinoResult<()> {
        if !self.robot_radius.is_finite() || self.robot_radius < 0.0 {
            return Err(KinoError::validation("robot radius must be finite and >= 0"));
        }
        self.obstacles.iter().try_for_each(|o| o.shape.validate())
    }

    /// Signed distance between the robot at `q` and the obstacle.
    pub fn distance_to(&self, obstacle: &Obstacle, q: &[f64]) -> f64 {
        obstacle.shape.signed_distance(Point::new(q[0], q[1])) - self.robot_radius
    }
}

impl CollisionChecker for PlanarWorld {
    /// Clearance is reported only when every collision obstacle also takes part in distance
    /// computation; otherwise no sound lower bound is known.
    fn check(&self, q: &[f64]) -> CollisionQuery {
        if q.len() < 2 {
            return CollisionQuery::Collision;
        }
        let mut clearance = Some(f64::INFINITY);
        for obstacle in self.obstacles.iter().filter(|o| o.collision) {
            let d = self.distance_to(obstacle, q);
            if d <= 0.0 {
                return CollisionQuery::Collision;
            }
            clearance = match clearance {
                Some(c) if obstacle.distance => Some(c.min(d)),
                _ => None,
            };
        }
        CollisionQuery::Free { clearance }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/collision/planar.rs"]
mod tests;
