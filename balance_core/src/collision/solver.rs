/*!
Sequential-impulse contact solver.

Bodies are flattened into `SolverBody` slots for one step. Static and kinematic bodies carry
zero inverse mass, so impulses never move them, but a kinematic body's velocity still feeds
the relative velocity at every contact it takes part in.

Velocity pass
- Normal impulses are accumulated and clamped to `λn >= 0`.
- Friction impulses are accumulated and clamped to `|λt| <= μ·λn` (Coulomb).
- Restitution targets `-e·vn0`, where `vn0` is the approach speed the bodies entered the step
  with, before gravity was integrated, and only when that approach is faster than the resting
  threshold. Measuring after gravity would hand every bounce an extra `|g|·dt`.
- Contacts still separated by a gap may approach by at most `gap / dt`, so a body arriving
  within the step stops at the surface instead of tunnelling.

Position pass
- Penetration beyond `LINEAR_SLOP` is projected out along the normal, split by inverse mass.
  Velocities are left untouched.
*/

use super::settings::{DIST_EPS, LINEAR_SLOP, POSITION_CORRECTION};
use super::types::{Material, Vec2};

/// Per-step view of a body as seen by the solver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverBody {
    pub center: Vec2,
    pub linvel: Vec2,
    /// Linear velocity at the start of the step, before external forces.
    pub entry_linvel: Vec2,
    pub angvel: f32,
    pub inv_mass: f32,
    pub inv_inertia: f32,
}

impl SolverBody {
    pub fn fixed(center: Vec2) -> Self {
        Self::kinematic(center, Vec2::zeros(), 0.0)
    }

    pub fn kinematic(center: Vec2, linvel: Vec2, angvel: f32) -> Self {
        Self {
            center,
            linvel,
            entry_linvel: linvel,
            angvel,
            inv_mass: 0.0,
            inv_inertia: 0.0,
        }
    }

    pub fn dynamic(center: Vec2, linvel: Vec2, angvel: f32, mass: f32, inertia: f32) -> Self {
        Self {
            center,
            linvel,
            entry_linvel: linvel,
            angvel,
            inv_mass: if mass > 0.0 { 1.0 / mass } else { 0.0 },
            inv_inertia: if inertia > 0.0 { 1.0 / inertia } else { 0.0 },
        }
    }

    /// Record the velocity the body had before gravity was applied this step.
    pub fn with_entry_velocity(mut self, entry_linvel: Vec2) -> Self {
        self.entry_linvel = entry_linvel;
        self
    }

    /// Velocity of the material point at offset `r` from the center.
    #[inline]
    fn velocity_at(&self, r: Vec2) -> Vec2 {
        self.linvel + Vec2::new(-self.angvel * r.y, self.angvel * r.x)
    }

    #[inline]
    fn entry_velocity_at(&self, r: Vec2) -> Vec2 {
        self.entry_linvel + Vec2::new(-self.angvel * r.y, self.angvel * r.x)
    }
}

/// A contact with solver indices and a combined material.
#[derive(Clone, Copy, Debug)]
pub struct SolverContact {
    pub a: usize,
    pub b: usize,
    /// Unit normal from `a` toward `b`.
    pub normal: Vec2,
    pub point: Vec2,
    pub dist: f32,
    pub material: Material,
}

/// Per-step solver parameters.
#[derive(Clone, Copy, Debug)]
pub struct VelocityParams {
    pub dt: f32,
    pub iterations: u32,
    pub restitution_threshold: f32,
}

#[derive(Clone, Copy, Debug)]
struct ContactConstraint {
    a: usize,
    b: usize,
    normal: Vec2,
    tangent: Vec2,
    ra: Vec2,
    rb: Vec2,
    normal_mass: f32,
    tangent_mass: f32,
    friction: f32,
    target_normal_velocity: f32,
    normal_impulse: f32,
    tangent_impulse: f32,
}

/// 2D scalar cross product.
#[inline]
fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

#[inline]
fn relative_velocity(bodies: &[SolverBody], c: &ContactConstraint) -> Vec2 {
    bodies[c.b].velocity_at(c.rb) - bodies[c.a].velocity_at(c.ra)
}

fn apply_impulse(bodies: &mut [SolverBody], c: &ContactConstraint, impulse: Vec2) {
    let a = &mut bodies[c.a];
    a.linvel -= impulse * a.inv_mass;
    a.angvel -= a.inv_inertia * cross(c.ra, impulse);

    let b = &mut bodies[c.b];
    b.linvel += impulse * b.inv_mass;
    b.angvel += b.inv_inertia * cross(c.rb, impulse);
}

fn prepare(
    bodies: &[SolverBody],
    contacts: &[SolverContact],
    params: &VelocityParams,
) -> Vec<ContactConstraint> {
    let mut constraints = Vec::with_capacity(contacts.len());

    for contact in contacts {
        if contact.a == contact.b {
            continue;
        }
        let (ba, bb) = (&bodies[contact.a], &bodies[contact.b]);
        let n = contact.normal;
        let t = Vec2::new(-n.y, n.x);
        let ra = contact.point - ba.center;
        let rb = contact.point - bb.center;

        let rn_a = cross(ra, n);
        let rn_b = cross(rb, n);
        let k_normal =
            ba.inv_mass + bb.inv_mass + ba.inv_inertia * rn_a * rn_a + bb.inv_inertia * rn_b * rn_b;
        if k_normal <= DIST_EPS {
            // Neither side can move.
            continue;
        }
        let rt_a = cross(ra, t);
        let rt_b = cross(rb, t);
        let k_tangent =
            ba.inv_mass + bb.inv_mass + ba.inv_inertia * rt_a * rt_a + bb.inv_inertia * rt_b * rt_b;

        let vn = (bb.velocity_at(rb) - ba.velocity_at(ra)).dot(&n);
        let vn0 = (bb.entry_velocity_at(rb) - ba.entry_velocity_at(ra)).dot(&n);
        let gap = contact.dist.max(0.0);
        let closes_this_step = vn * params.dt < -gap;
        let bounces = closes_this_step
            && contact.material.restitution > 0.0
            && -vn0 > params.restitution_threshold;
        let speculative = -gap / params.dt;
        let target_normal_velocity = if bounces {
            (-contact.material.restitution * vn0).max(speculative)
        } else {
            speculative
        };

        constraints.push(ContactConstraint {
            a: contact.a,
            b: contact.b,
            normal: n,
            tangent: t,
            ra,
            rb,
            normal_mass: 1.0 / k_normal,
            tangent_mass: if k_tangent > DIST_EPS { 1.0 / k_tangent } else { 0.0 },
            friction: contact.material.friction,
            target_normal_velocity,
            normal_impulse: 0.0,
            tangent_impulse: 0.0,
        });
    }

    constraints
}

/// Resolve contact velocities in place. Returns the number of contacts that ended the solve
/// carrying a non-zero normal impulse.
pub fn solve_velocities(
    bodies: &mut [SolverBody],
    contacts: &[SolverContact],
    params: &VelocityParams,
) -> usize {
    let mut constraints = prepare(bodies, contacts, params);

    for _ in 0..params.iterations.max(1) {
        for c in constraints.iter_mut() {
            // Friction first, bounded by the normal impulse accumulated so far.
            let vt = relative_velocity(bodies, c).dot(&c.tangent);
            let max_friction = c.friction * c.normal_impulse;
            let accumulated =
                (c.tangent_impulse - c.tangent_mass * vt).clamp(-max_friction, max_friction);
            let lambda_t = accumulated - c.tangent_impulse;
            c.tangent_impulse = accumulated;
            apply_impulse(bodies, c, c.tangent * lambda_t);

            let vn = relative_velocity(bodies, c).dot(&c.normal);
            let accumulated =
                (c.normal_impulse + c.normal_mass * (c.target_normal_velocity - vn)).max(0.0);
            let lambda_n = accumulated - c.normal_impulse;
            c.normal_impulse = accumulated;
            apply_impulse(bodies, c, c.normal * lambda_n);
        }
    }

    let engaged = constraints
        .iter()
        .filter(|c| c.normal_impulse > 0.0)
        .count();
    log::trace!(
        "velocity solve: {} contacts, {} engaged",
        constraints.len(),
        engaged
    );
    engaged
}

/// Push overlapping bodies apart along the contact normal. Returns the deepest penetration seen.
///
/// Only contacts with `dist < -LINEAR_SLOP` are corrected; the correction is split between the
/// two sides in proportion to inverse mass.
pub fn resolve_penetration(bodies: &mut [SolverBody], contacts: &[SolverContact]) -> f32 {
    let mut deepest = 0.0f32;

    for contact in contacts {
        if contact.a == contact.b {
            continue;
        }
        let penetration = -contact.dist;
        deepest = deepest.max(penetration);
        if penetration <= LINEAR_SLOP {
            continue;
        }

        let wa = bodies[contact.a].inv_mass;
        let wb = bodies[contact.b].inv_mass;
        let total = wa + wb;
        if total <= DIST_EPS {
            continue;
        }

        let correction = contact.normal * ((penetration - LINEAR_SLOP) * POSITION_CORRECTION / total);
        bodies[contact.a].center -= correction * wa;
        bodies[contact.b].center += correction * wb;
    }

    deepest
}
