//! Latest-value exchange between the pose producer, the control loop and any renderer.
//!
//! Nothing here blocks the loop for longer than a slot lock: a producer overwrites the slot
//! with its newest value, the consumer takes whatever is there (if anything) and moves on.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::SimError;
use crate::signal::PoseSample;

/// Single-value mailbox. A newer value replaces an unread older one.
#[derive(Debug)]
pub struct LatestSlot<T> {
    value: Mutex<Option<T>>,
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self {
            value: Mutex::new(None),
        }
    }
}

impl<T> LatestSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        // A panicked writer can only have left a whole value or none.
        self.value.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store `value`, returning the unread value it replaced.
    pub fn publish(&self, value: T) -> Option<T> {
        self.lock().replace(value)
    }

    /// Remove and return the current value without waiting.
    pub fn take(&self) -> Option<T> {
        self.lock().take()
    }
}

impl<T: Clone> LatestSlot<T> {
    /// Copy of the current value, leaving it in place.
    pub fn peek(&self) -> Option<T> {
        self.lock().clone()
    }
}

/// Where the control loop gets one pose sample per tick.
///
/// `poll` must not block. `Err(SensorUnavailable)` means the sensor is gone, not merely that
/// no hand is visible; the loop logs it and carries on as if nothing was detected.
pub trait PoseSource {
    fn poll(&mut self) -> Result<PoseSample, SimError>;
}

impl<F> PoseSource for F
where
    F: FnMut() -> Result<PoseSample, SimError>,
{
    fn poll(&mut self) -> Result<PoseSample, SimError> {
        self()
    }
}

#[derive(Debug, Default)]
struct PoseShared {
    slot: LatestSlot<PoseSample>,
    producers: AtomicUsize,
}

/// Create a connected producer handle and pose source.
pub fn pose_channel() -> (PosePublisher, SlotPoseSource) {
    let shared = Arc::new(PoseShared::default());
    shared.producers.store(1, Ordering::SeqCst);
    (
        PosePublisher {
            shared: Arc::clone(&shared),
        },
        SlotPoseSource { shared },
    )
}

/// Producer side. Clones count as additional producers.
#[derive(Debug)]
pub struct PosePublisher {
    shared: Arc<PoseShared>,
}

impl PosePublisher {
    pub fn publish(&self, sample: PoseSample) {
        self.shared.slot.publish(sample);
    }
}

impl Clone for PosePublisher {
    fn clone(&self) -> Self {
        self.shared.producers.fetch_add(1, Ordering::SeqCst);
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for PosePublisher {
    fn drop(&mut self) {
        self.shared.producers.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Consumer side of [`pose_channel`].
///
/// Yields the newest unread sample, `NotDetected` when nothing new arrived since the last
/// poll, and `SensorUnavailable` once every producer is gone and the slot is drained.
#[derive(Debug)]
pub struct SlotPoseSource {
    shared: Arc<PoseShared>,
}

impl PoseSource for SlotPoseSource {
    fn poll(&mut self) -> Result<PoseSample, SimError> {
        if let Some(sample) = self.shared.slot.take() {
            return Ok(sample);
        }
        if self.shared.producers.load(Ordering::SeqCst) == 0 {
            return Err(SimError::SensorUnavailable(
                "pose producer disconnected".into(),
            ));
        }
        Ok(PoseSample::NotDetected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::Vec2;

    #[test]
    fn newest_value_wins() {
        let slot = LatestSlot::new();
        assert_eq!(slot.publish(1), None);
        assert_eq!(slot.publish(2), Some(1));
        assert_eq!(slot.peek(), Some(2));
        assert_eq!(slot.take(), Some(2));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn source_reports_absence_then_disconnection() {
        let (publisher, mut source) = pose_channel();
        assert_eq!(source.poll(), Ok(PoseSample::NotDetected));

        let sample = PoseSample::detected(Vec2::new(1.0, 2.0), 0.5);
        publisher.publish(sample);
        assert_eq!(source.poll(), Ok(sample));
        assert_eq!(source.poll(), Ok(PoseSample::NotDetected));

        let second = publisher.clone();
        drop(publisher);
        second.publish(PoseSample::NotDetected);
        drop(second);

        // The last value is still delivered before the loss is reported.
        assert_eq!(source.poll(), Ok(PoseSample::NotDetected));
        assert!(matches!(source.poll(), Err(SimError::SensorUnavailable(_))));
    }

    #[test]
    fn samples_cross_threads() {
        let (publisher, mut source) = pose_channel();
        let handle = std::thread::spawn(move || {
            for i in 0..10 {
                publisher.publish(PoseSample::detected(Vec2::new(i as f32, 0.0), 0.0));
            }
        });
        handle.join().unwrap();

        let last = source.poll().unwrap();
        assert_eq!(last, PoseSample::detected(Vec2::new(9.0, 0.0), 0.0));
        assert!(source.poll().is_err());
    }

    #[test]
    fn closures_are_pose_sources() {
        let mut calls = 0;
        let mut source = || {
            calls += 1;
            Ok::<_, SimError>(PoseSample::NotDetected)
        };
        assert_eq!(source.poll(), Ok(PoseSample::NotDetected));
        assert_eq!(source.poll(), Ok(PoseSample::NotDetected));
        drop(source);
        assert_eq!(calls, 2);
    }
}
