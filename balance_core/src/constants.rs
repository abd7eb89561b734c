/// Default playfield width in world units (pixels).
pub const PLAYFIELD_WIDTH: f32 = 800.0;

/// Default playfield height in world units (pixels).
pub const PLAYFIELD_HEIGHT: f32 = 600.0;

/// Default vertical gravity in world units per second squared.
///
/// Convention:
/// - World origin is the bottom-left corner of the playfield, +Y is up.
/// - Negative values pull bodies toward the floor.
pub const GRAVITY: f32 = -981.0;

/// Fixed simulation step (seconds). Wall-clock frame time never leaks into the solver.
pub const FIXED_DT: f32 = 1.0 / 60.0;

/// Upper bound on fixed steps run for a single rendered frame.
///
/// When the loop falls further behind than this, the remaining accumulated time is dropped.
pub const MAX_CATCH_UP_STEPS: u32 = 5;

/// Exponential smoothing factor applied to the platform position target.
///
/// Typical values: 0.1 .. 0.3. 1.0 tracks the raw estimate with no lag.
pub const POSITION_ALPHA: f32 = 0.15;

/// Exponential smoothing factor applied to the platform orientation target.
pub const ORIENTATION_ALPHA: f32 = 0.1;

/// Seconds between projectile spawns (90 frames at 60 FPS).
pub const SPAWN_INTERVAL_S: f32 = 1.5;

/// Horizontal inset from each side wall inside which projectiles spawn.
pub const SPAWN_INSET: f32 = 100.0;

/// Distance below the top of the playfield at which projectiles appear.
pub const SPAWN_DROP: f32 = 50.0;

/// Maximum number of live projectiles. Spawns falling due above the cap are skipped.
pub const MAX_LIVE_BODIES: usize = 5;

pub const PROJECTILE_RADIUS: f32 = 12.0;
pub const PROJECTILE_MASS: f32 = 1.5;
pub const PROJECTILE_FRICTION: f32 = 0.6;
pub const PROJECTILE_RESTITUTION: f32 = 0.7;

/// Boundary material. Materials combine multiplicatively, so a neutral boundary (1.0)
/// lets the projectile's own coefficients decide the bounce.
pub const BOUNDARY_FRICTION: f32 = 1.0;
pub const BOUNDARY_RESTITUTION: f32 = 1.0;

/// Thickness of the static boundary boxes laid outside the playfield.
pub const BOUNDARY_THICKNESS: f32 = 50.0;

/// Platform (controlled body) box size.
pub const PLATFORM_WIDTH: f32 = 120.0;
pub const PLATFORM_HEIGHT: f32 = 12.0;
pub const PLATFORM_FRICTION: f32 = 0.9;
pub const PLATFORM_RESTITUTION: f32 = 0.85;

/// Keep the platform center at least this far from every playfield edge.
pub const PLATFORM_MARGIN: f32 = 50.0;

/// How far outside the playfield a projectile center may travel before it expires.
pub const OUT_OF_BOUNDS_MARGIN: f32 = 50.0;

/// Capture zone as fractions of the playfield width and absolute heights above the floor.
///
/// The zone spans `[0.35 * width, 0.65 * width]` horizontally and `[20, 70]` vertically.
pub const CAPTURE_MIN_X_FRACTION: f32 = 0.35;
pub const CAPTURE_MAX_X_FRACTION: f32 = 0.65;
pub const CAPTURE_MIN_Y: f32 = 20.0;
pub const CAPTURE_MAX_Y: f32 = 70.0;

/// Default seed for the spawn generator.
pub const DEFAULT_SEED: u64 = 0x5EED_BA11;

/// Landmark indices in the 21-point hand model.
pub const WRIST_LANDMARK: usize = 0;
pub const MIDDLE_MCP_LANDMARK: usize = 9;
pub const HAND_LANDMARK_COUNT: usize = 21;
