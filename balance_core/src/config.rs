use serde::{Deserialize, Serialize};

use crate::capture::{CaptureZone, Rect};
use crate::collision::settings::VELOCITY_ITERATIONS;
use crate::collision::{Material, Vec2};
use crate::constants::{
    BOUNDARY_FRICTION, BOUNDARY_RESTITUTION, BOUNDARY_THICKNESS, DEFAULT_SEED, FIXED_DT, GRAVITY,
    MAX_CATCH_UP_STEPS, MAX_LIVE_BODIES, ORIENTATION_ALPHA, OUT_OF_BOUNDS_MARGIN,
    PLATFORM_FRICTION, PLATFORM_HEIGHT, PLATFORM_MARGIN, PLATFORM_RESTITUTION, PLATFORM_WIDTH,
    PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH, POSITION_ALPHA, PROJECTILE_FRICTION, PROJECTILE_MASS,
    PROJECTILE_RADIUS, PROJECTILE_RESTITUTION, SPAWN_DROP, SPAWN_INSET, SPAWN_INTERVAL_S,
};
use crate::error::SimError;
use crate::signal::SmoothingAlphas;
use crate::spawner::SpawnerSettings;
use crate::world::WorldSettings;

/// Every tunable of the simulation. Missing JSON fields take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub width: f32,
    pub height: f32,
    pub gravity: f32,

    pub position_alpha: f32,
    pub orientation_alpha: f32,

    pub fixed_dt: f32,
    pub max_catch_up_steps: u32,
    pub solver_iterations: u32,

    pub spawn_interval: f32,
    pub spawn_inset: f32,
    pub spawn_drop: f32,
    pub max_live_bodies: usize,
    pub seed: u64,

    /// `None` places the zone at its default spot for the playfield width.
    pub capture_zone: Option<Rect>,
    pub max_capture_speed: Option<f32>,

    pub projectile_radius: f32,
    pub projectile_mass: f32,
    pub projectile_material: Material,

    pub boundary_material: Material,
    pub boundary_thickness: f32,

    pub platform_width: f32,
    pub platform_height: f32,
    pub platform_material: Material,
    pub platform_margin: f32,

    pub out_of_bounds_margin: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: PLAYFIELD_WIDTH,
            height: PLAYFIELD_HEIGHT,
            gravity: GRAVITY,
            position_alpha: POSITION_ALPHA,
            orientation_alpha: ORIENTATION_ALPHA,
            fixed_dt: FIXED_DT,
            max_catch_up_steps: MAX_CATCH_UP_STEPS,
            solver_iterations: VELOCITY_ITERATIONS,
            spawn_interval: SPAWN_INTERVAL_S,
            spawn_inset: SPAWN_INSET,
            spawn_drop: SPAWN_DROP,
            max_live_bodies: MAX_LIVE_BODIES,
            seed: DEFAULT_SEED,
            capture_zone: None,
            max_capture_speed: None,
            projectile_radius: PROJECTILE_RADIUS,
            projectile_mass: PROJECTILE_MASS,
            projectile_material: Material::new(PROJECTILE_FRICTION, PROJECTILE_RESTITUTION),
            boundary_material: Material::new(BOUNDARY_FRICTION, BOUNDARY_RESTITUTION),
            boundary_thickness: BOUNDARY_THICKNESS,
            platform_width: PLATFORM_WIDTH,
            platform_height: PLATFORM_HEIGHT,
            platform_material: Material::new(PLATFORM_FRICTION, PLATFORM_RESTITUTION),
            platform_margin: PLATFORM_MARGIN,
            out_of_bounds_margin: OUT_OF_BOUNDS_MARGIN,
        }
    }
}

impl SimConfig {
    pub fn from_json(text: &str) -> Result<Self, SimError> {
        let config: SimConfig = serde_json::from_str(text)
            .map_err(|e| SimError::InvalidConfig(format!("malformed config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, SimError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SimError::InvalidConfig(format!("cannot serialize config: {e}")))
    }

    /// Check every value; the first problem found is returned.
    pub fn validate(&self) -> Result<(), SimError> {
        self.world_settings().validate()?;
        self.alphas().validate()?;
        self.spawner_settings().validate()?;
        self.capture_zone()?;

        if !(self.fixed_dt.is_finite() && self.fixed_dt > 0.0) {
            return Err(SimError::InvalidTimestep(self.fixed_dt));
        }
        if self.max_catch_up_steps == 0 {
            return Err(SimError::InvalidConfig(
                "max catch-up steps must be at least 1".into(),
            ));
        }
        if self.max_live_bodies == 0 {
            return Err(SimError::InvalidConfig(
                "max live bodies must be at least 1".into(),
            ));
        }
        if !(self.platform_margin.is_finite() && self.platform_margin >= 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "platform margin must be finite and non-negative, got {}",
                self.platform_margin
            )));
        }
        Ok(())
    }

    pub fn world_settings(&self) -> WorldSettings {
        WorldSettings {
            width: self.width,
            height: self.height,
            gravity: self.gravity,
            boundary_material: self.boundary_material,
            boundary_thickness: self.boundary_thickness,
            platform_size: Vec2::new(self.platform_width, self.platform_height),
            platform_material: self.platform_material,
            out_of_bounds_margin: self.out_of_bounds_margin,
            solver_iterations: self.solver_iterations,
        }
    }

    pub fn alphas(&self) -> SmoothingAlphas {
        SmoothingAlphas {
            position: self.position_alpha,
            orientation: self.orientation_alpha,
        }
    }

    pub fn spawner_settings(&self) -> SpawnerSettings {
        SpawnerSettings {
            width: self.width,
            height: self.height,
            interval: f64::from(self.spawn_interval),
            inset: self.spawn_inset,
            drop: self.spawn_drop,
            radius: self.projectile_radius,
            mass: self.projectile_mass,
            material: self.projectile_material,
            seed: self.seed,
        }
    }

    pub fn capture_zone(&self) -> Result<CaptureZone, SimError> {
        let rect = self
            .capture_zone
            .unwrap_or_else(|| CaptureZone::default_rect(self.width));
        CaptureZone::new(rect, self.width, self.height)?.with_max_capture_speed(self.max_capture_speed)
    }

    /// Box the platform center is kept inside: the playfield shrunk by the margin on each side.
    pub fn platform_bounds(&self) -> (Vec2, Vec2) {
        let m = self.platform_margin;
        (
            Vec2::new(m, m),
            Vec2::new(self.width - m, self.height - m),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        let zone = config.capture_zone().unwrap();
        assert!(zone.max_capture_speed().is_none());
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config = SimConfig::from_json(r#"{ "gravity": -9.81, "seed": 12 }"#).unwrap();
        assert!((config.gravity + 9.81).abs() < 1.0e-6);
        assert_eq!(config.seed, 12);
        assert_eq!(config.width, PLAYFIELD_WIDTH);
        assert_eq!(config.max_live_bodies, MAX_LIVE_BODIES);
    }

    #[test]
    fn json_round_trip_preserves_overrides() {
        let mut config = SimConfig::default();
        config.capture_zone = Some(Rect::new(100.0, 30.0, 200.0, 90.0));
        config.max_capture_speed = Some(100.0);
        config.projectile_material = Material::new(0.3, 0.4);

        let text = config.to_json_pretty().unwrap();
        let back = SimConfig::from_json(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn invalid_values_fail_fast() {
        let bad = |f: fn(&mut SimConfig)| {
            let mut c = SimConfig::default();
            f(&mut c);
            c.validate()
        };

        assert!(matches!(bad(|c| c.position_alpha = 0.0), Err(SimError::InvalidConfig(_))));
        assert!(matches!(bad(|c| c.fixed_dt = -1.0), Err(SimError::InvalidTimestep(_))));
        assert!(matches!(bad(|c| c.width = -5.0), Err(SimError::InvalidConfig(_))));
        assert!(matches!(
            bad(|c| c.capture_zone = Some(Rect::new(0.0, 0.0, 900.0, 10.0))),
            Err(SimError::CaptureZoneMisconfigured(_))
        ));
        assert!(matches!(bad(|c| c.spawn_inset = 450.0), Err(SimError::InvalidConfig(_))));
        assert!(matches!(bad(|c| c.projectile_mass = 0.0), Err(SimError::InvalidConfig(_))));
        assert!(matches!(bad(|c| c.max_catch_up_steps = 0), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert!(matches!(
            SimConfig::from_json("{ not json"),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn platform_bounds_apply_the_margin() {
        let (lo, hi) = SimConfig::default().platform_bounds();
        assert_eq!(lo, Vec2::new(50.0, 50.0));
        assert_eq!(hi, Vec2::new(750.0, 550.0));
    }
}
