/*!
The fixed-timestep control loop.

Per tick, in order:
1. poll one pose sample (sensor loss counts as "not detected")
2. condition it into a platform target, clamped to the platform margin
3. drive the platform and step the world by the fixed `dt`
4. capture bodies in the zone, then expire bodies that left the playfield
5. spawn a projectile if one is due and the live cap allows it

`advance` feeds wall-clock frame time into an accumulator and runs as many fixed ticks as fit,
up to `max_catch_up_steps`. Whatever is left beyond that is dropped, so a stalled frame never
snowballs into ever longer catch-up.
*/

use serde::{Deserialize, Serialize};

use crate::body::BodyId;
use crate::capture::{CaptureEvent, CaptureZoneMonitor, Score};
use crate::collision::Vec2;
use crate::config::SimConfig;
use crate::error::SimError;
use crate::handoff::PoseSource;
use crate::signal::{ConditionedSignal, PoseSample, SignalConditioner};
use crate::snapshot::WorldSnapshot;
use crate::spawner::Spawner;
use crate::utils::clamp_to_box;
use crate::world::{PhysicsWorld, StepStats};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopState {
    Running,
    Paused,
    /// Terminal; every later command is ignored.
    Terminated,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Pause,
    Resume,
    TogglePause,
    Reset,
    Quit,
    ToggleDiagnosticOverlay,
}

/// What happened during one fixed tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub pose_detected: bool,
    pub captures: Vec<CaptureEvent>,
    pub expired: Vec<BodyId>,
    pub spawned: Option<BodyId>,
    /// A spawn fell due while the live cap was reached.
    pub spawn_skipped: bool,
    pub step: StepStats,
}

/// What happened during one `advance` call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub ticks: Vec<TickReport>,
    /// Accumulated seconds discarded because the catch-up bound was hit.
    pub dropped_time: f64,
}

impl FrameReport {
    pub fn tick_count(&self) -> usize {
        self.ticks.len()
    }

    pub fn captures(&self) -> impl Iterator<Item = &CaptureEvent> {
        self.ticks.iter().flat_map(|t| t.captures.iter())
    }
}

pub struct ControlLoop {
    config: SimConfig,
    world: PhysicsWorld,
    conditioner: SignalConditioner,
    monitor: CaptureZoneMonitor,
    spawner: Spawner,
    score: Score,
    state: LoopState,
    show_diagnostics: bool,
    accumulator: f64,
    sensor_lost: bool,
}

impl ControlLoop {
    /// Build every component from `config`. Any invalid value fails here, never mid-run.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let world = PhysicsWorld::with_settings(config.world_settings())?;
        let conditioner = SignalConditioner::new(config.alphas())?;
        let monitor = CaptureZoneMonitor::new(config.capture_zone()?);
        let spawner = Spawner::new(config.spawner_settings())?;
        log::info!(
            "control loop ready: dt {:.4}s, up to {} catch-up steps, seed {:#x}",
            config.fixed_dt,
            config.max_catch_up_steps,
            config.seed
        );
        Ok(Self {
            config,
            world,
            conditioner,
            monitor,
            spawner,
            score: Score::default(),
            state: LoopState::Running,
            show_diagnostics: false,
            accumulator: 0.0,
            sensor_lost: false,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score.value()
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    /// Direct world access for embedding code (scripted scenes, tests).
    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    pub fn signal(&self) -> ConditionedSignal {
        self.conditioner.current()
    }

    pub fn show_diagnostics(&self) -> bool {
        self.show_diagnostics
    }

    pub fn is_terminated(&self) -> bool {
        self.state == LoopState::Terminated
    }

    pub fn handle(&mut self, command: Command) {
        if self.state == LoopState::Terminated {
            log::debug!("ignoring {command:?}: loop terminated");
            return;
        }

        let next = match (command, self.state) {
            (Command::Pause, LoopState::Running) | (Command::TogglePause, LoopState::Running) => {
                LoopState::Paused
            }
            (Command::Resume, LoopState::Paused) | (Command::TogglePause, LoopState::Paused) => {
                LoopState::Running
            }
            (Command::Quit, _) => LoopState::Terminated,
            (Command::Reset, _) => {
                self.reset();
                self.state
            }
            (Command::ToggleDiagnosticOverlay, _) => {
                self.show_diagnostics = !self.show_diagnostics;
                self.state
            }
            (_, state) => state,
        };

        if next != self.state {
            log::info!("loop {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    fn reset(&mut self) {
        self.world.reset();
        self.score.reset();
        self.conditioner.reset();
        self.spawner.reset();
        self.accumulator = 0.0;
        log::info!("simulation reset");
    }

    /// Run one fixed tick. Returns `None` unless the loop is running.
    pub fn tick<S: PoseSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<Option<TickReport>, SimError> {
        if self.state != LoopState::Running {
            return Ok(None);
        }

        let sample = self.acquire(source);
        let signal = self.conditioner.update(&sample);
        if let Some((position, angle)) = self.platform_target(signal) {
            self.world.drive_controlled_body(position, angle);
        }

        let step = self.world.step(self.config.fixed_dt)?;

        let captures = self.monitor.evaluate(&mut self.world, &mut self.score);

        let expired = self.world.bodies_out_of_bounds();
        for id in &expired {
            if self.world.remove_body(*id).is_some() {
                log::debug!("body {id} left the playfield");
            }
        }

        let mut spawned = None;
        let mut spawn_skipped = false;
        if let Some(desc) = self.spawner.maybe_spawn(self.world.elapsed()) {
            if self.world.body_count() >= self.config.max_live_bodies {
                spawn_skipped = true;
                log::debug!(
                    "spawn skipped: {} live bodies at the cap",
                    self.world.body_count()
                );
            } else {
                spawned = Some(self.world.add_body(desc)?);
            }
        }

        Ok(Some(TickReport {
            pose_detected: sample.is_detected(),
            captures,
            expired,
            spawned,
            spawn_skipped,
            step,
        }))
    }

    /// Account for `frame_time` seconds of wall clock and run the fixed ticks that fit.
    ///
    /// Paused and terminated loops neither poll nor accumulate.
    pub fn advance<S: PoseSource + ?Sized>(
        &mut self,
        frame_time: f64,
        source: &mut S,
    ) -> Result<FrameReport, SimError> {
        if !(frame_time.is_finite() && frame_time >= 0.0) {
            return Err(SimError::InvalidTimestep(frame_time as f32));
        }
        let mut report = FrameReport::default();
        if self.state != LoopState::Running {
            return Ok(report);
        }

        let dt = f64::from(self.config.fixed_dt);
        self.accumulator += frame_time;

        while self.accumulator >= dt && report.ticks.len() < self.config.max_catch_up_steps as usize
        {
            match self.tick(source)? {
                Some(tick) => report.ticks.push(tick),
                None => break,
            }
            self.accumulator -= dt;
        }

        if self.accumulator >= dt {
            let keep = self.accumulator % dt;
            report.dropped_time = self.accumulator - keep;
            self.accumulator = keep;
            log::warn!(
                "falling behind: dropped {:.3}s of simulation after {} catch-up steps",
                report.dropped_time,
                report.ticks.len()
            );
        }

        Ok(report)
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(
            &self.world,
            self.monitor.zone().rect(),
            self.score.value(),
            self.state,
            self.show_diagnostics,
        )
    }

    fn acquire<S: PoseSource + ?Sized>(&mut self, source: &mut S) -> PoseSample {
        match source.poll() {
            Ok(sample) => {
                if self.sensor_lost {
                    log::info!("pose sensor available again");
                    self.sensor_lost = false;
                }
                sample
            }
            Err(e) => {
                if !self.sensor_lost {
                    log::warn!("{e}; holding the last platform target");
                    self.sensor_lost = true;
                }
                PoseSample::NotDetected
            }
        }
    }

    /// Conditioned signal as a platform pose, channels never seen falling back to the current
    /// pose. `None` until something has been detected.
    fn platform_target(&self, signal: ConditionedSignal) -> Option<(Vec2, f32)> {
        if signal.position.is_none() && signal.orientation.is_none() {
            return None;
        }
        let platform = self.world.platform();
        let (lo, hi) = self.config.platform_bounds();
        let position = clamp_to_box(signal.position.unwrap_or(platform.position), lo, hi);
        let angle = signal.orientation.unwrap_or(platform.angle);
        Some((position, angle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_hand() -> impl FnMut() -> Result<PoseSample, SimError> {
        || Ok(PoseSample::NotDetected)
    }

    #[test]
    fn toggles_and_quit() {
        let mut lp = ControlLoop::new(SimConfig::default()).unwrap();
        assert_eq!(lp.state(), LoopState::Running);

        lp.handle(Command::TogglePause);
        assert_eq!(lp.state(), LoopState::Paused);
        lp.handle(Command::Pause);
        assert_eq!(lp.state(), LoopState::Paused);
        lp.handle(Command::Resume);
        assert_eq!(lp.state(), LoopState::Running);

        lp.handle(Command::ToggleDiagnosticOverlay);
        assert!(lp.show_diagnostics());

        lp.handle(Command::Quit);
        assert!(lp.is_terminated());
        lp.handle(Command::Resume);
        lp.handle(Command::Reset);
        assert_eq!(lp.state(), LoopState::Terminated);
    }

    #[test]
    fn paused_loop_does_not_poll() {
        let mut lp = ControlLoop::new(SimConfig::default()).unwrap();
        lp.handle(Command::Pause);

        let mut polls = 0;
        let mut source = || {
            polls += 1;
            Ok::<_, SimError>(PoseSample::NotDetected)
        };
        assert!(lp.tick(&mut source).unwrap().is_none());
        let frame = lp.advance(1.0, &mut source).unwrap();
        assert_eq!(frame.tick_count(), 0);
        drop(source);
        assert_eq!(polls, 0);
        assert_eq!(lp.world().elapsed(), 0.0);
    }

    #[test]
    fn platform_follows_the_hand_within_the_margin() {
        let mut config = SimConfig::default();
        config.position_alpha = 1.0;
        config.orientation_alpha = 1.0;
        let mut lp = ControlLoop::new(config).unwrap();

        let mut source = || Ok::<_, SimError>(PoseSample::detected(Vec2::new(5.0, 580.0), 0.4));
        lp.tick(&mut source).unwrap();

        let p = lp.world().platform();
        assert_eq!(p.position, Vec2::new(50.0, 550.0));
        assert!((p.angle - 0.4).abs() < 1.0e-5);
    }

    #[test]
    fn lost_sensor_holds_the_platform() {
        let mut config = SimConfig::default();
        config.position_alpha = 1.0;
        let mut lp = ControlLoop::new(config).unwrap();

        let mut seen = || Ok::<_, SimError>(PoseSample::detected(Vec2::new(200.0, 300.0), 0.0));
        lp.tick(&mut seen).unwrap();

        let mut gone = || Err::<PoseSample, _>(SimError::SensorUnavailable("camera closed".into()));
        for _ in 0..10 {
            let report = lp.tick(&mut gone).unwrap().unwrap();
            assert!(!report.pose_detected);
        }
        assert_eq!(lp.world().platform().position, Vec2::new(200.0, 300.0));
        assert_eq!(lp.world().platform().linear_velocity, Vec2::zeros());
    }

    #[test]
    fn catch_up_is_bounded_and_excess_dropped() {
        let mut lp = ControlLoop::new(SimConfig::default()).unwrap();
        let mut source = no_hand();

        let frame = lp.advance(1.0, &mut source).unwrap();
        assert_eq!(frame.tick_count(), 5);
        let dt = f64::from(lp.config().fixed_dt);
        assert!(frame.dropped_time > 1.0 - 6.0 * dt);
        assert!(lp.accumulator < dt);

        let frame = lp.advance(dt, &mut source).unwrap();
        assert!(frame.tick_count() <= 2);
        assert_eq!(frame.dropped_time, 0.0);
    }

    #[test]
    fn spawns_respect_the_live_cap() {
        let mut config = SimConfig::default();
        config.spawn_interval = 0.05;
        config.max_live_bodies = 2;
        // No gravity: bodies hover where they spawn and stay out of the zone.
        config.gravity = 0.0;
        let mut lp = ControlLoop::new(config).unwrap();
        let mut source = no_hand();

        let mut skipped = 0;
        for _ in 0..120 {
            let report = lp.tick(&mut source).unwrap().unwrap();
            skipped += usize::from(report.spawn_skipped);
            assert!(lp.world().body_count() <= 2);
            assert!(!(report.spawn_skipped && report.spawned.is_some()));
        }
        assert_eq!(lp.world().body_count(), 2);
        assert!(skipped > 0);
    }

    #[test]
    fn invalid_frame_time_is_rejected() {
        let mut lp = ControlLoop::new(SimConfig::default()).unwrap();
        let mut source = no_hand();
        assert!(matches!(
            lp.advance(-0.1, &mut source),
            Err(SimError::InvalidTimestep(_))
        ));
        assert!(lp.advance(f64::NAN, &mut source).is_err());
    }
}
