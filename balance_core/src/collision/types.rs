/*!
Core collision types and math aliases shared by the collision submodules.

This module intentionally contains no algorithms. It defines the data exchanged between:
- broad (loosened AABB proxies and candidate pairs)
- narrow_phase (parry2d contact queries)
- solver (sequential-impulse velocity and position passes)
- the world, which owns the bodies and feeds all of the above every step

Conventions
- World units are playfield pixels, origin bottom-left, +Y up.
- Angles are radians, counter-clockwise positive.
- Contact normals point from body `a` toward body `b`.
*/

pub use parry2d::na;
use parry2d::shape::{self as pshape, Shape};
use serde::{Deserialize, Serialize};

/// Common math aliases for clarity and consistency.
pub type Vec2 = na::Vector2<f32>;
pub type Point2 = na::Point2<f32>;
pub type Iso = na::Isometry2<f32>;

/// Surface coefficients attached to every collider.
///
/// Pairs combine multiplicatively: `friction = fa * fb`, `restitution = ea * eb`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub friction: f32,
    pub restitution: f32,
}

impl Material {
    pub const fn new(friction: f32, restitution: f32) -> Self {
        Self {
            friction,
            restitution,
        }
    }

    #[inline]
    pub fn combine(&self, other: &Material) -> Material {
        Material {
            friction: self.friction * other.friction,
            restitution: self.restitution * other.restitution,
        }
    }

    /// Finite, non-negative friction and restitution in `[0, 1]`.
    pub fn is_valid(&self) -> bool {
        self.friction.is_finite()
            && self.friction >= 0.0
            && self.restitution.is_finite()
            && (0.0..=1.0).contains(&self.restitution)
    }
}

/// A world pose: translation plus rotation angle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub translation: Vec2,
    pub angle: f32,
}

impl Pose {
    #[inline]
    pub fn new(translation: Vec2, angle: f32) -> Self {
        Self { translation, angle }
    }

    /// Convert to nalgebra `Isometry2` for use with parry2d queries.
    #[inline]
    pub fn iso(&self) -> Iso {
        Iso::new(self.translation, self.angle)
    }
}

/// Collider shapes used by the world.
///
/// - Ball: projectiles.
/// - Cuboid: the platform and the boundary slabs.
#[derive(Clone, Copy, Debug)]
pub enum ColliderShape {
    Ball(pshape::Ball),
    Cuboid(pshape::Cuboid),
}

impl ColliderShape {
    #[inline]
    pub fn ball(radius: f32) -> Self {
        Self::Ball(pshape::Ball::new(radius))
    }

    #[inline]
    pub fn cuboid(half_extents: Vec2) -> Self {
        Self::Cuboid(pshape::Cuboid::new(half_extents))
    }

    #[inline]
    pub fn as_shape(&self) -> &dyn Shape {
        match self {
            Self::Ball(ball) => ball,
            Self::Cuboid(cuboid) => cuboid,
        }
    }
}

/// Which live object a collider proxy belongs to.
///
/// Free bodies are referenced by their index in the world's body list for the duration
/// of a single step; indices are never stored across steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColliderOwner {
    Free(usize),
    Platform,
    Boundary(usize),
}

impl ColliderOwner {
    #[inline]
    pub fn is_dynamic(&self) -> bool {
        matches!(self, ColliderOwner::Free(_))
    }
}

/// A single contact between two colliders, produced by the narrow phase.
#[derive(Clone, Copy, Debug)]
pub struct ContactPoint {
    pub a: ColliderOwner,
    pub b: ColliderOwner,
    /// World-space unit normal pointing from `a` toward `b`.
    pub normal: Vec2,
    /// World-space contact point (midway between the two surfaces).
    pub point: Point2,
    /// Signed separation along `normal`; negative means penetration.
    pub dist: f32,
}
