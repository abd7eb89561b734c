use serde::{Deserialize, Serialize};

use crate::body::BodyId;
use crate::collision::Vec2;
use crate::constants::{
    CAPTURE_MAX_X_FRACTION, CAPTURE_MAX_Y, CAPTURE_MIN_X_FRACTION, CAPTURE_MIN_Y,
};
use crate::error::SimError;
use crate::world::PhysicsWorld;

/// Axis-aligned rectangle in world coordinates. Bounds are inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Rect {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Does the segment `a → b` touch the rectangle? Slab test, inclusive on every edge.
    pub fn segment_intersects(&self, a: Vec2, b: Vec2) -> bool {
        let mut t_min = 0.0f32;
        let mut t_max = 1.0f32;
        let d = b - a;

        for (start, delta, lo, hi) in [
            (a.x, d.x, self.min_x, self.max_x),
            (a.y, d.y, self.min_y, self.max_y),
        ] {
            if delta == 0.0 {
                if start < lo || start > hi {
                    return false;
                }
                continue;
            }
            let (mut t0, mut t1) = ((lo - start) / delta, (hi - start) / delta);
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return false;
            }
        }
        true
    }
}

/// The scoring region plus the rule for what counts as a catch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptureZone {
    rect: Rect,
    /// When set, only bodies with `|vy|` below this qualify.
    max_capture_speed: Option<f32>,
}

impl CaptureZone {
    /// Validate `rect` against a `width` x `height` playfield.
    pub fn new(rect: Rect, width: f32, height: f32) -> Result<Self, SimError> {
        let finite = [rect.min_x, rect.min_y, rect.max_x, rect.max_y]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(SimError::CaptureZoneMisconfigured(format!(
                "non-finite bounds {rect:?}"
            )));
        }
        if !(rect.min_x < rect.max_x && rect.min_y < rect.max_y) {
            return Err(SimError::CaptureZoneMisconfigured(format!(
                "empty rectangle x [{}, {}] y [{}, {}]",
                rect.min_x, rect.max_x, rect.min_y, rect.max_y
            )));
        }
        if rect.min_x < 0.0 || rect.min_y < 0.0 || rect.max_x > width || rect.max_y > height {
            return Err(SimError::CaptureZoneMisconfigured(format!(
                "x [{}, {}] y [{}, {}] not inside the {width}x{height} playfield",
                rect.min_x, rect.max_x, rect.min_y, rect.max_y
            )));
        }
        Ok(Self {
            rect,
            max_capture_speed: None,
        })
    }

    /// The default zone: the middle 30% of the width, just above the floor.
    pub fn default_for(width: f32, height: f32) -> Result<Self, SimError> {
        Self::new(Self::default_rect(width), width, height)
    }

    pub fn default_rect(width: f32) -> Rect {
        Rect::new(
            CAPTURE_MIN_X_FRACTION * width,
            CAPTURE_MIN_Y,
            CAPTURE_MAX_X_FRACTION * width,
            CAPTURE_MAX_Y,
        )
    }

    pub fn with_max_capture_speed(mut self, limit: Option<f32>) -> Result<Self, SimError> {
        if let Some(v) = limit {
            if !(v.is_finite() && v > 0.0) {
                return Err(SimError::CaptureZoneMisconfigured(format!(
                    "capture speed limit must be finite and positive, got {v}"
                )));
            }
        }
        self.max_capture_speed = limit;
        Ok(self)
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn max_capture_speed(&self) -> Option<f32> {
        self.max_capture_speed
    }

    /// Center-point rule, applied to the path the center took over the last step.
    pub fn qualifies(&self, previous: Vec2, current: Vec2, velocity: Vec2) -> bool {
        if let Some(limit) = self.max_capture_speed {
            if !(velocity.y.abs() < limit) {
                return false;
            }
        }
        self.rect.contains(current) || self.rect.segment_intersects(previous, current)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaptureEvent {
    pub body_id: BodyId,
    /// Center at the moment of removal.
    pub position: [f32; 2],
}

/// Running total of captures. Only ever grows, except for an explicit reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Score(u32);

impl Score {
    pub fn value(&self) -> u32 {
        self.0
    }

    fn record_capture(&mut self) {
        self.0 = self.0.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }
}

#[derive(Clone, Debug)]
pub struct CaptureZoneMonitor {
    zone: CaptureZone,
}

impl CaptureZoneMonitor {
    pub fn new(zone: CaptureZone) -> Self {
        Self { zone }
    }

    pub fn zone(&self) -> &CaptureZone {
        &self.zone
    }

    /// Capture every qualifying body: remove it from `world` and add one to `score` per body.
    ///
    /// A removed body is gone before this returns, so no later call can count it again.
    pub fn evaluate(&self, world: &mut PhysicsWorld, score: &mut Score) -> Vec<CaptureEvent> {
        let caught: Vec<BodyId> = world
            .bodies()
            .iter()
            .filter(|b| self.zone.qualifies(b.previous_position, b.position, b.velocity))
            .map(|b| b.id)
            .collect();

        let mut events = Vec::with_capacity(caught.len());
        for id in caught {
            let Some(body) = world.remove_body(id) else {
                continue;
            };
            score.record_capture();
            log::debug!(
                "captured body {id} at ({:.1}, {:.1}); score {}",
                body.position.x,
                body.position.y,
                score.value()
            );
            events.push(CaptureEvent {
                body_id: id,
                position: [body.position.x, body.position.y],
            });
        }
        events
    }
}
