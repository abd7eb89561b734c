use parry2d::bounding_volume::Aabb;

use super::types::{ColliderOwner, ColliderShape, Iso, Pose, Vec2, na};

/// A collider placed in the world for the duration of one step.
///
/// Notes:
/// - `iso` is the pose at the start of the step; contacts are generated there.
/// - `motion` bounds how far any point of the collider can travel during the step.
/// - `aabb` is the world-space AABB loosened by `motion` plus half the contact skin, so two
///   loosened AABBs overlap whenever the pair can come within skin distance during the step.
#[derive(Clone, Copy, Debug)]
pub struct ColliderProxy {
    pub owner: ColliderOwner,
    pub shape: ColliderShape,
    pub iso: Iso,
    pub motion: f32,
    pub aabb: Aabb,
}

impl ColliderProxy {
    pub fn new(
        owner: ColliderOwner,
        shape: ColliderShape,
        pose: Pose,
        motion: f32,
        skin: f32,
    ) -> Self {
        let iso = pose.iso();
        let tight = shape.as_shape().compute_aabb(&iso);
        let motion = if motion.is_finite() { motion.max(0.0) } else { 0.0 };
        Self {
            owner,
            shape,
            iso,
            motion,
            aabb: aabb_inflate(&tight, motion + 0.5 * skin.max(0.0)),
        }
    }
}

/// Upper bound on the distance a point of a moving body travels during `dt`.
///
/// `bounding_radius` is the farthest point of the shape from its center; rotation sweeps
/// that point by `|angvel| * bounding_radius` per second.
#[inline]
pub fn motion_bound(linvel: Vec2, angvel: f32, bounding_radius: f32, dt: f32) -> f32 {
    (linvel.norm() + angvel.abs() * bounding_radius) * dt
}

/// Sort-and-sweep along X over all proxies.
///
/// Returns index pairs `(i, j)` with `i < j` whose AABBs overlap and where at least one side
/// is a dynamic body. Static-static and static-kinematic pairs never produce contacts.
/// The output is sorted so iteration order (and thus the solver) is deterministic.
pub fn candidate_pairs(proxies: &[ColliderProxy]) -> Vec<(usize, usize)> {
    let mut order: Vec<usize> = (0..proxies.len()).collect();
    order.sort_by(|&a, &b| {
        proxies[a]
            .aabb
            .mins
            .x
            .total_cmp(&proxies[b].aabb.mins.x)
            .then(a.cmp(&b))
    });

    let mut active: Vec<usize> = Vec::new();
    let mut pairs: Vec<(usize, usize)> = Vec::new();

    for &i in &order {
        let current = &proxies[i];
        active.retain(|&j| proxies[j].aabb.maxs.x >= current.aabb.mins.x);

        for &j in &active {
            let other = &proxies[j];
            if !current.owner.is_dynamic() && !other.owner.is_dynamic() {
                continue;
            }
            if aabb_intersects(&current.aabb, &other.aabb) {
                pairs.push((i.min(j), i.max(j)));
            }
        }
        active.push(i);
    }

    pairs.sort_unstable();
    pairs
}

/// Inflate an AABB by `margin` on all sides.
fn aabb_inflate(a: &Aabb, margin: f32) -> Aabb {
    if margin <= 0.0 {
        return *a;
    }
    let delta = na::Vector2::new(margin, margin);
    Aabb {
        mins: a.mins - delta,
        maxs: a.maxs + delta,
    }
}

/// Test two AABBs for intersection (touching counts).
fn aabb_intersects(a: &Aabb, b: &Aabb) -> bool {
    !(a.maxs.x < b.mins.x || a.mins.x > b.maxs.x || a.maxs.y < b.mins.y || a.mins.y > b.maxs.y)
}
