pub mod body;
pub mod capture;
pub mod collision;
pub mod config;
pub mod constants;
pub mod control;
pub mod error;
pub mod handoff;
pub mod rng;
pub mod signal;
pub mod snapshot;
pub mod spawner;
pub mod utils;
pub mod world;

pub use body::{BodyId, Boundary, BoundaryKind, ControlledBody, FreeBody, FreeBodyDesc};
pub use capture::{CaptureEvent, CaptureZone, CaptureZoneMonitor, Rect, Score};
pub use collision::{Material, Vec2, types::na};
pub use config::SimConfig;
pub use control::{Command, ControlLoop, FrameReport, LoopState, TickReport};
pub use error::SimError;
pub use handoff::{LatestSlot, PosePublisher, PoseSource, SlotPoseSource, pose_channel};
pub use signal::{
    ConditionedSignal, HandLandmarks, PoseSample, SignalConditioner, SmoothingAlphas, condition,
};
pub use snapshot::WorldSnapshot;
pub use spawner::{Spawner, SpawnerSettings};
pub use utils::{FrameMapping, angle_delta, wrap_angle};
pub use world::{PhysicsWorld, StepStats, WorldSettings};
