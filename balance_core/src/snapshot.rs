use serde::{Deserialize, Serialize};

use crate::body::{BodyId, BoundaryKind};
use crate::capture::Rect;
use crate::control::LoopState;
use crate::world::PhysicsWorld;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundaryView {
    pub kind: BoundaryKind,
    pub center: [f32; 2],
    pub half_extents: [f32; 2],
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlatformView {
    pub center: [f32; 2],
    pub half_extents: [f32; 2],
    pub angle: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodyView {
    pub id: BodyId,
    pub center: [f32; 2],
    pub radius: f32,
    pub angle: f32,
    pub velocity: [f32; 2],
}

/// Read-only picture of one frame, everything a renderer needs and nothing it can change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub width: f32,
    pub height: f32,
    pub boundaries: Vec<BoundaryView>,
    pub platform: PlatformView,
    pub bodies: Vec<BodyView>,
    pub capture_zone: Rect,
    pub score: u32,
    pub state: LoopState,
    pub show_diagnostics: bool,
    /// Simulated seconds since start or the last reset.
    pub sim_time: f64,
}

impl WorldSnapshot {
    pub fn capture(
        world: &PhysicsWorld,
        capture_zone: Rect,
        score: u32,
        state: LoopState,
        show_diagnostics: bool,
    ) -> Self {
        let settings = world.settings();
        let platform = world.platform();
        Self {
            width: settings.width,
            height: settings.height,
            boundaries: world
                .boundaries()
                .iter()
                .map(|b| BoundaryView {
                    kind: b.kind,
                    center: [b.center.x, b.center.y],
                    half_extents: [b.half_extents.x, b.half_extents.y],
                })
                .collect(),
            platform: PlatformView {
                center: [platform.position.x, platform.position.y],
                half_extents: [platform.half_extents.x, platform.half_extents.y],
                angle: platform.angle,
            },
            bodies: world
                .bodies()
                .iter()
                .map(|b| BodyView {
                    id: b.id,
                    center: [b.position.x, b.position.y],
                    radius: b.radius,
                    angle: b.angle,
                    velocity: [b.velocity.x, b.velocity.y],
                })
                .collect(),
            capture_zone,
            score,
            state,
            show_diagnostics,
            sim_time: world.elapsed(),
        }
    }
}
