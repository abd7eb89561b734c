/*!
Collision root module.

Contact generation and resolution for the 2D world, built on parry2d for shape queries and a
small sequential-impulse solver. The code is split for clarity:

- types:        shared data types (Material, Pose, ColliderShape, ContactPoint) and math aliases
- settings:     solver iteration counts and tolerance constants
- broad:        loosened AABB proxies and sort-and-sweep candidate pairs
- narrow_phase: thin wrappers over parry2d contact queries
- solver:       velocity (impulse) and position (projection) passes
*/

pub mod broad;
pub mod narrow_phase;
pub mod settings;
pub mod solver;
pub mod types;

// Re-export commonly used types.
pub use broad::{ColliderProxy, candidate_pairs, motion_bound};
pub use narrow_phase::{contact_between, contacts_for_pairs};
pub use solver::{SolverBody, SolverContact, VelocityParams, resolve_penetration, solve_velocities};
pub use types::{ColliderOwner, ColliderShape, ContactPoint, Iso, Material, Point2, Pose, Vec2};
