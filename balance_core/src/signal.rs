//! Turns noisy, intermittent pose estimates into a stable platform target.
//!
//! Each channel (position, orientation) is smoothed independently with an exponential moving
//! average. When the estimator loses the hand, the last value is held as is. Orientation is
//! blended along the shortest arc so a rotation across ±π never spins the long way round.

use crate::collision::Vec2;
use crate::constants::{
    HAND_LANDMARK_COUNT, MIDDLE_MCP_LANDMARK, ORIENTATION_ALPHA, POSITION_ALPHA, WRIST_LANDMARK,
};
use crate::error::SimError;
use crate::utils::{FrameMapping, angle_delta, orientation_between, wrap_angle};

/// One frame's worth of estimator output, already in world coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PoseSample {
    NotDetected,
    /// A detection may carry only one channel; the missing one keeps its previous value.
    Detected {
        position: Option<Vec2>,
        orientation: Option<f32>,
    },
}

impl PoseSample {
    pub fn detected(position: Vec2, orientation: f32) -> Self {
        Self::Detected {
            position: Some(position),
            orientation: Some(orientation),
        }
    }

    pub fn is_detected(&self) -> bool {
        matches!(self, Self::Detected { .. })
    }
}

/// Smoothed platform target. `None` means the channel has never been detected.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ConditionedSignal {
    pub position: Option<Vec2>,
    /// Always within (−π, π].
    pub orientation: Option<f32>,
}

/// Smoothing factors, each in (0, 1]. 1.0 tracks the raw estimate exactly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmoothingAlphas {
    pub position: f32,
    pub orientation: f32,
}

impl Default for SmoothingAlphas {
    fn default() -> Self {
        Self {
            position: POSITION_ALPHA,
            orientation: ORIENTATION_ALPHA,
        }
    }
}

impl SmoothingAlphas {
    /// Same factor for both channels.
    pub fn uniform(alpha: f32) -> Self {
        Self {
            position: alpha,
            orientation: alpha,
        }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        for (name, alpha) in [("position", self.position), ("orientation", self.orientation)] {
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(SimError::InvalidConfig(format!(
                    "{name} smoothing factor must be in (0, 1], got {alpha}"
                )));
            }
        }
        Ok(())
    }
}

/// One conditioning step.
///
/// - `NotDetected` returns `prev` unchanged.
/// - The first detection of a channel is taken as is.
/// - Later detections move the channel `alpha` of the way toward the estimate.
/// - Non-finite channel values are treated as missing.
pub fn condition(
    prev: ConditionedSignal,
    sample: &PoseSample,
    alphas: SmoothingAlphas,
) -> ConditionedSignal {
    let PoseSample::Detected {
        position,
        orientation,
    } = *sample
    else {
        return prev;
    };

    let position = match (prev.position, position.filter(|p| p.iter().all(|v| v.is_finite()))) {
        (_, None) => prev.position,
        (None, Some(target)) => Some(target),
        (Some(s), Some(target)) => Some(s * (1.0 - alphas.position) + target * alphas.position),
    };

    let orientation = match (
        prev.orientation,
        orientation.filter(|a| a.is_finite()).map(wrap_angle),
    ) {
        (_, None) => prev.orientation,
        (None, Some(target)) => Some(target),
        // A blend through the shortest delta is not exact at alpha 1, so full tracking takes
        // the target as is.
        (Some(_), Some(target)) if alphas.orientation >= 1.0 => Some(target),
        (Some(s), Some(target)) => {
            Some(wrap_angle(s + angle_delta(s, target) * alphas.orientation))
        }
    };

    ConditionedSignal {
        position,
        orientation,
    }
}

/// Stateful wrapper around [`condition`].
#[derive(Clone, Debug)]
pub struct SignalConditioner {
    alphas: SmoothingAlphas,
    state: ConditionedSignal,
}

impl Default for SignalConditioner {
    fn default() -> Self {
        Self {
            alphas: SmoothingAlphas::default(),
            state: ConditionedSignal::default(),
        }
    }
}

impl SignalConditioner {
    pub fn new(alphas: SmoothingAlphas) -> Result<Self, SimError> {
        alphas.validate()?;
        Ok(Self {
            alphas,
            state: ConditionedSignal::default(),
        })
    }

    pub fn with_alpha(alpha: f32) -> Result<Self, SimError> {
        Self::new(SmoothingAlphas::uniform(alpha))
    }

    pub fn update(&mut self, sample: &PoseSample) -> ConditionedSignal {
        self.state = condition(self.state, sample, self.alphas);
        self.state
    }

    pub fn current(&self) -> ConditionedSignal {
        self.state
    }

    pub fn alphas(&self) -> SmoothingAlphas {
        self.alphas
    }

    /// Forget everything, as if no hand had ever been seen.
    pub fn reset(&mut self) {
        self.state = ConditionedSignal::default();
    }
}

/// Raw output of a 21-point hand landmark estimator, in image pixels (origin top-left, +Y down).
#[derive(Clone, Debug, PartialEq)]
pub struct HandLandmarks {
    points: [(f32, f32); HAND_LANDMARK_COUNT],
}

impl HandLandmarks {
    pub fn new(points: [(f32, f32); HAND_LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Build from a flat list; `None` unless exactly 21 points are given.
    pub fn from_slice(points: &[(f32, f32)]) -> Option<Self> {
        let points: [(f32, f32); HAND_LANDMARK_COUNT] = points.try_into().ok()?;
        Some(Self { points })
    }

    pub fn point(&self, index: usize) -> Option<(f32, f32)> {
        self.points.get(index).copied()
    }

    /// Position from the wrist, orientation along wrist → middle-finger knuckle, both mapped
    /// into world coordinates. Non-finite landmarks drop the channel they feed.
    pub fn to_sample(&self, mapping: &FrameMapping) -> PoseSample {
        let finite = |(x, y): (f32, f32)| x.is_finite() && y.is_finite();
        let wrist = self.points[WRIST_LANDMARK];
        let knuckle = self.points[MIDDLE_MCP_LANDMARK];

        let position = finite(wrist).then(|| mapping.to_world(wrist.0, wrist.1));
        let orientation = if finite(wrist) && finite(knuckle) {
            orientation_between(
                mapping.to_world(wrist.0, wrist.1),
                mapping.to_world(knuckle.0, knuckle.1),
            )
        } else {
            None
        };

        PoseSample::Detected {
            position,
            orientation,
        }
    }
}
