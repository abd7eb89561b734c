use serde::{Deserialize, Serialize};

use crate::collision::{ColliderShape, Material, Pose, Vec2};
use crate::error::SimError;

/// Opaque handle of a free body. Issued in increasing order and never reused by a world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u64);

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything needed to introduce a projectile into the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FreeBodyDesc {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub mass: f32,
    pub material: Material,
}

impl FreeBodyDesc {
    /// A ball at rest at `position`.
    pub fn ball(position: Vec2, radius: f32, mass: f32, material: Material) -> Self {
        Self {
            position,
            velocity: Vec2::zeros(),
            radius,
            mass,
            material,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(SimError::InvalidBodyParameters(format!(
                "mass must be finite and positive, got {}",
                self.mass
            )));
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(SimError::InvalidBodyParameters(format!(
                "radius must be finite and positive, got {}",
                self.radius
            )));
        }
        if !self.material.is_valid() {
            return Err(SimError::InvalidBodyParameters(format!(
                "friction {} / restitution {} out of range",
                self.material.friction, self.material.restitution
            )));
        }
        if !(self.position.iter().all(|v| v.is_finite())
            && self.velocity.iter().all(|v| v.is_finite()))
        {
            return Err(SimError::InvalidBodyParameters(
                "position and velocity must be finite".into(),
            ));
        }
        Ok(())
    }
}

/// A dynamic ball moved by gravity and contacts.
#[derive(Clone, Debug, PartialEq)]
pub struct FreeBody {
    pub id: BodyId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub angular_velocity: f32,
    pub radius: f32,
    pub mass: f32,
    pub material: Material,
    /// Center at the start of the most recent step.
    pub previous_position: Vec2,
}

impl FreeBody {
    pub(crate) fn from_desc(id: BodyId, desc: &FreeBodyDesc) -> Self {
        Self {
            id,
            position: desc.position,
            velocity: desc.velocity,
            angle: 0.0,
            angular_velocity: 0.0,
            radius: desc.radius,
            mass: desc.mass,
            material: desc.material,
            previous_position: desc.position,
        }
    }

    /// Moment of inertia of a solid disc.
    #[inline]
    pub fn inertia(&self) -> f32 {
        0.5 * self.mass * self.radius * self.radius
    }

    #[inline]
    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.angle)
    }

    #[inline]
    pub fn shape(&self) -> ColliderShape {
        ColliderShape::ball(self.radius)
    }
}

/// The platform: a kinematic box that follows a target pose.
///
/// Its velocity is derived from the pose change over each step so resting bodies are carried
/// and struck bodies pick up momentum. Contacts never move it.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlledBody {
    pub position: Vec2,
    pub angle: f32,
    pub half_extents: Vec2,
    pub material: Material,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    pub(crate) target: Option<Pose>,
}

impl ControlledBody {
    pub fn new(position: Vec2, half_extents: Vec2, material: Material) -> Self {
        Self {
            position,
            angle: 0.0,
            half_extents,
            material,
            linear_velocity: Vec2::zeros(),
            angular_velocity: 0.0,
            target: None,
        }
    }

    #[inline]
    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.angle)
    }

    #[inline]
    pub fn shape(&self) -> ColliderShape {
        ColliderShape::cuboid(self.half_extents)
    }

    /// Distance from the center to a corner.
    #[inline]
    pub fn bounding_radius(&self) -> f32 {
        self.half_extents.norm()
    }

    /// Pose the platform will reach at the end of the next step, if one was requested.
    pub fn pending_target(&self) -> Option<Pose> {
        self.target
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryKind {
    LeftWall,
    RightWall,
    Floor,
}

/// A static box lying just outside the playfield.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Boundary {
    pub kind: BoundaryKind,
    pub center: Vec2,
    pub half_extents: Vec2,
    pub material: Material,
}

impl Boundary {
    /// Left wall, right wall and floor for a `width` x `height` playfield.
    ///
    /// Walls extend `thickness` below the floor so the corners are closed, and run `thickness`
    /// above the top edge. The top itself is open.
    pub fn enclosing(width: f32, height: f32, thickness: f32, material: Material) -> [Boundary; 3] {
        let half_t = 0.5 * thickness;
        let wall_half_height = 0.5 * height + thickness;
        let wall_center_y = 0.5 * height;
        [
            Boundary {
                kind: BoundaryKind::LeftWall,
                center: Vec2::new(-half_t, wall_center_y),
                half_extents: Vec2::new(half_t, wall_half_height),
                material,
            },
            Boundary {
                kind: BoundaryKind::RightWall,
                center: Vec2::new(width + half_t, wall_center_y),
                half_extents: Vec2::new(half_t, wall_half_height),
                material,
            },
            Boundary {
                kind: BoundaryKind::Floor,
                center: Vec2::new(0.5 * width, -half_t),
                half_extents: Vec2::new(0.5 * width + thickness, half_t),
                material,
            },
        ]
    }

    #[inline]
    pub fn pose(&self) -> Pose {
        Pose::new(self.center, 0.0)
    }

    #[inline]
    pub fn shape(&self) -> ColliderShape {
        ColliderShape::cuboid(self.half_extents)
    }

    /// Lower-left and upper-right corners.
    pub fn corners(&self) -> (Vec2, Vec2) {
        (self.center - self.half_extents, self.center + self.half_extents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material() -> Material {
        Material::new(0.5, 0.5)
    }

    #[test]
    fn desc_validation_rejects_bad_parameters() {
        let ok = FreeBodyDesc::ball(Vec2::new(10.0, 10.0), 5.0, 1.0, material());
        assert!(ok.validate().is_ok());

        let mut bad = ok;
        bad.mass = 0.0;
        assert!(matches!(bad.validate(), Err(SimError::InvalidBodyParameters(_))));

        let mut bad = ok;
        bad.radius = f32::NAN;
        assert!(matches!(bad.validate(), Err(SimError::InvalidBodyParameters(_))));

        let mut bad = ok;
        bad.material.restitution = 1.5;
        assert!(matches!(bad.validate(), Err(SimError::InvalidBodyParameters(_))));

        let bad = ok.with_velocity(Vec2::new(f32::INFINITY, 0.0));
        assert!(matches!(bad.validate(), Err(SimError::InvalidBodyParameters(_))));
    }

    #[test]
    fn boundaries_sit_outside_the_playfield() {
        let [left, right, floor] = Boundary::enclosing(800.0, 600.0, 50.0, material());

        assert_eq!(left.kind, BoundaryKind::LeftWall);
        assert!((left.corners().1.x - 0.0).abs() < 1.0e-6);
        assert!((right.corners().0.x - 800.0).abs() < 1.0e-6);
        assert!((floor.corners().1.y - 0.0).abs() < 1.0e-6);
        // Walls reach below the floor's underside so the corners are closed.
        assert!(left.corners().0.y <= floor.corners().0.y);
        assert!(floor.corners().0.x <= left.corners().0.x);
        assert!(floor.corners().1.x >= right.corners().1.x);
    }

    #[test]
    fn disc_inertia() {
        let body = FreeBody::from_desc(
            BodyId(1),
            &FreeBodyDesc::ball(Vec2::zeros(), 2.0, 3.0, material()),
        );
        assert!((body.inertia() - 6.0).abs() < 1.0e-6);
        assert_eq!(body.previous_position, body.position);
    }
}
