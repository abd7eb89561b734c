/*!
Contact solver settings and tolerances.

These constants centralize the parameters used by the broad phase, the contact solver
and the positional correction pass. Keeping them together makes tuning easier and helps
ensure deterministic behavior across platforms.

Notes
- Distances are in world units (pixels), time in seconds.
- Favor practical world-space tolerances over machine epsilon for robust behavior.
*/

/// Gauss-Seidel iterations of the velocity solver per step.
pub const VELOCITY_ITERATIONS: u32 = 8;

/// Positional projection passes per step. Each pass re-queries contacts.
pub const POSITION_ITERATIONS: u32 = 2;

/// Penetration tolerated without positional correction (world units).
/// Too small causes jitter on resting contacts; too large leaves visible overlap.
pub const LINEAR_SLOP: f32 = 0.5;

/// Fraction of the penetration beyond `LINEAR_SLOP` removed per positional pass.
pub const POSITION_CORRECTION: f32 = 0.8;

/// Extra distance added to every contact query beyond what the pair can close in one step.
pub const CONTACT_SKIN: f32 = 1.0;

/// Lower bound for the approach speed below which contacts do not bounce.
///
/// The effective threshold is `max(RESTITUTION_SPEED_FLOOR, 2 * |g| * dt)`, so a body resting
/// under gravity never picks up restitution from the velocity gravity added this step.
pub const RESTITUTION_SPEED_FLOOR: f32 = 0.1;

/// Practical small value for comparisons and degenerate guards.
pub const DIST_EPS: f32 = 1.0e-6;

/// Effective restitution threshold for a given gravity and step.
#[inline]
pub fn restitution_threshold(gravity: f32, dt: f32) -> f32 {
    RESTITUTION_SPEED_FLOOR.max(2.0 * gravity.abs() * dt)
}
