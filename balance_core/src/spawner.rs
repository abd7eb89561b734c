use crate::body::FreeBodyDesc;
use crate::collision::{Material, Vec2};
use crate::constants::{
    DEFAULT_SEED, PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH, PROJECTILE_FRICTION, PROJECTILE_MASS,
    PROJECTILE_RADIUS, PROJECTILE_RESTITUTION, SPAWN_DROP, SPAWN_INSET, SPAWN_INTERVAL_S,
};
use crate::error::SimError;
use crate::rng::SimpleRng;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnerSettings {
    pub width: f32,
    pub height: f32,
    /// Seconds between spawns.
    pub interval: f64,
    /// Horizontal distance kept clear from each side wall.
    pub inset: f32,
    /// Spawn height below the top edge.
    pub drop: f32,
    pub radius: f32,
    pub mass: f32,
    pub material: Material,
    pub seed: u64,
}

impl Default for SpawnerSettings {
    fn default() -> Self {
        Self {
            width: PLAYFIELD_WIDTH,
            height: PLAYFIELD_HEIGHT,
            interval: f64::from(SPAWN_INTERVAL_S),
            inset: SPAWN_INSET,
            drop: SPAWN_DROP,
            radius: PROJECTILE_RADIUS,
            mass: PROJECTILE_MASS,
            material: Material::new(PROJECTILE_FRICTION, PROJECTILE_RESTITUTION),
            seed: DEFAULT_SEED,
        }
    }
}

impl SpawnerSettings {
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.interval.is_finite() && self.interval > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "spawn interval must be finite and positive, got {}",
                self.interval
            )));
        }
        if !(self.inset.is_finite() && self.inset >= 0.0 && 2.0 * self.inset <= self.width) {
            return Err(SimError::InvalidConfig(format!(
                "spawn inset {} leaves no room in a playfield {} wide",
                self.inset, self.width
            )));
        }
        if !(self.drop.is_finite() && self.drop >= 0.0 && self.drop < self.height) {
            return Err(SimError::InvalidConfig(format!(
                "spawn drop {} must lie within the playfield height {}",
                self.drop, self.height
            )));
        }
        // Body parameters share the world's validation.
        self.template(Vec2::new(self.width * 0.5, self.height - self.drop))
            .validate()
            .map_err(|e| SimError::InvalidConfig(format!("projectile template: {e}")))
    }

    fn template(&self, position: Vec2) -> FreeBodyDesc {
        FreeBodyDesc::ball(position, self.radius, self.mass, self.material)
    }
}

/// Time-based projectile source.
///
/// The spawner only decides when and where; whether a due body may enter the world (the live
/// cap) is up to the caller.
///
/// A body is due whenever the tick time reaches the next scheduled time. The schedule then
/// advances by one interval; if the caller has fallen more than an interval behind, the
/// schedule re-anchors on the current time so a long stall produces one body, not a burst.
#[derive(Clone, Debug)]
pub struct Spawner {
    settings: SpawnerSettings,
    rng: SimpleRng,
    next_due: f64,
}

impl Spawner {
    pub fn new(settings: SpawnerSettings) -> Result<Self, SimError> {
        settings.validate()?;
        Ok(Self {
            rng: SimpleRng::from_seed(settings.seed),
            next_due: settings.interval,
            settings,
        })
    }

    pub fn settings(&self) -> &SpawnerSettings {
        &self.settings
    }

    /// Simulated time at which the next body falls due.
    pub fn next_due(&self) -> f64 {
        self.next_due
    }

    pub fn maybe_spawn(&mut self, tick_time: f64) -> Option<FreeBodyDesc> {
        if tick_time < self.next_due {
            return None;
        }

        self.next_due += self.settings.interval;
        if self.next_due <= tick_time {
            self.next_due = tick_time + self.settings.interval;
        }

        let s = &self.settings;
        let x = self.rng.gen_range_f32(s.inset, s.width - s.inset);
        let y = s.height - s.drop;
        Some(self.settings.template(Vec2::new(x, y)))
    }

    /// Restart the schedule and the random sequence from the configured seed.
    pub fn reset(&mut self) {
        self.rng = SimpleRng::from_seed(self.settings.seed);
        self.next_due = self.settings.interval;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawner(seed: u64) -> Spawner {
        Spawner::new(SpawnerSettings {
            seed,
            ..SpawnerSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn nothing_before_the_first_interval() {
        let mut s = spawner(1);
        assert!(s.maybe_spawn(0.0).is_none());
        assert!(s.maybe_spawn(1.49).is_none());
        assert!(s.maybe_spawn(1.5).is_some());
        assert!(s.maybe_spawn(1.6).is_none());
        assert!(s.maybe_spawn(3.0).is_some());
    }

    #[test]
    fn spawns_inside_the_inset_below_the_top() {
        let mut s = spawner(9);
        let mut t = 0.0;
        for _ in 0..50 {
            t += 1.5;
            let desc = s.maybe_spawn(t).unwrap();
            assert!(desc.position.x >= 100.0 && desc.position.x <= 700.0);
            assert!((desc.position.y - 550.0).abs() < 1.0e-6);
            assert_eq!(desc.velocity, Vec2::zeros());
            assert!((desc.radius - 12.0).abs() < 1.0e-6);
            assert!((desc.mass - 1.5).abs() < 1.0e-6);
        }
    }

    #[test]
    fn long_stall_yields_one_body_and_reanchors() {
        let mut s = spawner(3);
        assert!(s.maybe_spawn(100.0).is_some());
        assert!(s.maybe_spawn(100.0).is_none());
        assert!((s.next_due() - 101.5).abs() < 1.0e-9);
    }

    #[test]
    fn same_seed_reproduces_positions_and_reset_rewinds() {
        let mut a = spawner(77);
        let mut b = spawner(77);
        let xs: Vec<f32> = (1..=5)
            .map(|i| a.maybe_spawn(1.5 * i as f64).unwrap().position.x)
            .collect();
        let ys: Vec<f32> = (1..=5)
            .map(|i| b.maybe_spawn(1.5 * i as f64).unwrap().position.x)
            .collect();
        assert_eq!(xs, ys);

        a.reset();
        assert!((a.next_due() - 1.5).abs() < 1.0e-9);
        assert_eq!(a.maybe_spawn(1.5).unwrap().position.x, xs[0]);
    }

    #[test]
    fn rejects_inset_wider_than_half_the_playfield() {
        let settings = SpawnerSettings {
            inset: 500.0,
            ..SpawnerSettings::default()
        };
        assert!(matches!(Spawner::new(settings), Err(SimError::InvalidConfig(_))));

        let settings = SpawnerSettings {
            interval: 0.0,
            ..SpawnerSettings::default()
        };
        assert!(Spawner::new(settings).is_err());
    }
}
