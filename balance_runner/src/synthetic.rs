//! A stand-in for the camera and hand estimator.
//!
//! The producer thread waits for a frame trigger carrying the current simulated time, builds
//! 21 landmarks for a flat hand sweeping left and right while rocking, and publishes the resulting
//! pose sample. Every few seconds the hand leaves the frame for a moment.

use std::f32::consts::TAU;
use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};

use balance_core::constants::{HAND_LANDMARK_COUNT, MIDDLE_MCP_LANDMARK, WRIST_LANDMARK};
use balance_core::rng::{HAND_STREAM, SimpleRng};
use balance_core::{FrameMapping, HandLandmarks, PosePublisher, PoseSample};

/// Camera resolution the synthetic landmarks are expressed in.
const FRAME_WIDTH: f32 = 640.0;
const FRAME_HEIGHT: f32 = 480.0;

/// Seconds for one full left-right sweep.
const SWEEP_PERIOD_S: f32 = 6.0;
/// Seconds for one full rock of the wrist.
const ROCK_PERIOD_S: f32 = 2.5;
/// Peak wrist roll, radians.
const ROCK_AMPLITUDE: f32 = 0.45;
/// Wrist to middle knuckle, image pixels.
const PALM_LENGTH_PX: f32 = 60.0;
/// Per-axis landmark noise, image pixels.
const JITTER_PX: f32 = 3.0;

/// The hand is out of frame for `DROPOUT_S` at the end of every `DROPOUT_EVERY_S`.
const DROPOUT_EVERY_S: f32 = 7.0;
const DROPOUT_S: f32 = 1.2;

pub struct SyntheticHand {
    mapping: FrameMapping,
    rng: SimpleRng,
}

impl SyntheticHand {
    pub fn new(world_width: f32, world_height: f32, seed: u64) -> Self {
        Self {
            mapping: FrameMapping::new(FRAME_WIDTH, FRAME_HEIGHT, world_width, world_height)
                .mirrored(),
            rng: SimpleRng::from_stream(seed, HAND_STREAM),
        }
    }

    pub fn sample_at(&mut self, t: f32) -> PoseSample {
        if t.rem_euclid(DROPOUT_EVERY_S) > DROPOUT_EVERY_S - DROPOUT_S {
            return PoseSample::NotDetected;
        }
        self.landmarks_at(t).to_sample(&self.mapping)
    }

    fn landmarks_at(&mut self, t: f32) -> HandLandmarks {
        let sweep = (TAU * t / SWEEP_PERIOD_S).sin();
        let roll = ROCK_AMPLITUDE * (TAU * t / ROCK_PERIOD_S).sin();

        let wrist_x = FRAME_WIDTH * (0.5 + 0.35 * sweep) + self.jitter();
        let wrist_y = FRAME_HEIGHT * 0.6 + self.jitter();

        // A flat hand held like a tray. The image is mirrored and y grows downward, so fingers
        // pointing toward world +X at `roll` sit toward image -X and up the image.
        let toward = |reach: f32| (-reach * roll.cos(), -reach * roll.sin());
        let mut points = [(wrist_x, wrist_y); HAND_LANDMARK_COUNT];
        for (i, p) in points.iter_mut().enumerate().skip(1) {
            let (dx, dy) = toward(PALM_LENGTH_PX * (0.4 + 0.08 * i as f32));
            *p = (wrist_x + dx + self.jitter(), wrist_y + dy + self.jitter());
        }
        let (dx, dy) = toward(PALM_LENGTH_PX);
        points[WRIST_LANDMARK] = (wrist_x, wrist_y);
        points[MIDDLE_MCP_LANDMARK] = (wrist_x + dx, wrist_y + dy);
        HandLandmarks::new(points)
    }

    fn jitter(&mut self) -> f32 {
        self.rng.gen_range_f32(-JITTER_PX, JITTER_PX)
    }
}

/// Run the producer until the trigger channel closes. Dropping the publisher on exit tells the
/// control loop the sensor is gone.
pub fn spawn_producer(
    publisher: PosePublisher,
    mut hand: SyntheticHand,
    frames: Receiver<f64>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("pose-producer".into())
        .spawn(move || {
            let mut published = 0u64;
            for t in frames {
                publisher.publish(hand.sample_at(t as f32));
                published += 1;
            }
            tracing::debug!(published, "pose producer stopped");
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_hand_at_start_maps_near_the_middle() {
        let mut hand = SyntheticHand::new(800.0, 600.0, 1);
        let PoseSample::Detected {
            position,
            orientation,
        } = hand.sample_at(0.0)
        else {
            panic!("hand should be visible at t = 0");
        };

        let p = position.unwrap();
        assert!((p.x - 400.0).abs() < 5.0, "x = {}", p.x);
        assert!((p.y - 240.0).abs() < 5.0, "y = {}", p.y);
        assert!(orientation.unwrap().abs() < 0.1);
    }

    #[test]
    fn hand_drops_out_periodically() {
        let mut hand = SyntheticHand::new(800.0, 600.0, 1);
        assert_eq!(hand.sample_at(6.5), PoseSample::NotDetected);
        assert!(hand.sample_at(7.5).is_detected());
    }
}
