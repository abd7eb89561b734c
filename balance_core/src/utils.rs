use std::f32::consts::{PI, TAU};

use crate::collision::types::Vec2;

/// Normalize an angle (radians) into the canonical range (−π, π].
///
/// Every orientation is passed through this before it is compared or interpolated so
/// that π and −π never produce a spurious full-circle delta. Angles already in range and
/// non-finite input are returned unchanged; callers filter the latter.
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    if !angle.is_finite() || (angle > -PI && angle <= PI) {
        return angle;
    }
    // rem_euclid lands in [0, TAU]; shift back to [−π, π] and fold −π onto +π.
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

/// Shortest signed rotation taking `from` to `to`, in (−π, π].
#[inline]
pub fn angle_delta(from: f32, to: f32) -> f32 {
    wrap_angle(to - from)
}

/// Orientation of the axis running from `p0` to `p1`.
///
/// 0 points along +X, positive angles are counter-clockwise, range (−π, π].
/// Returns `None` when the points coincide (no axis to measure).
#[inline]
pub fn orientation_between(p0: Vec2, p1: Vec2) -> Option<f32> {
    const MIN_AXIS_LEN_SQ: f32 = 1.0e-12;
    let axis = p1 - p0;
    if !(axis.norm_squared() > MIN_AXIS_LEN_SQ) {
        return None;
    }
    Some(wrap_angle(axis.y.atan2(axis.x)))
}

/// Maps image-space estimator coordinates into world coordinates.
///
/// Image space: pixels, origin top-left, +Y down.
/// World space: origin bottom-left, +Y up, scaled to the playfield.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameMapping {
    pub frame_width: f32,
    pub frame_height: f32,
    pub world_width: f32,
    pub world_height: f32,
    /// Mirror horizontally, for selfie-style cameras.
    pub mirror_x: bool,
}

impl FrameMapping {
    pub fn new(frame_width: f32, frame_height: f32, world_width: f32, world_height: f32) -> Self {
        Self {
            frame_width,
            frame_height,
            world_width,
            world_height,
            mirror_x: false,
        }
    }

    /// Identity-sized mapping: the camera frame has the playfield's dimensions.
    pub fn same_size(width: f32, height: f32) -> Self {
        Self::new(width, height, width, height)
    }

    pub fn mirrored(mut self) -> Self {
        self.mirror_x = true;
        self
    }

    #[inline]
    pub fn to_world(&self, x: f32, y: f32) -> Vec2 {
        let mut u = x / self.frame_width;
        if self.mirror_x {
            u = 1.0 - u;
        }
        let v = y / self.frame_height;
        Vec2::new(u * self.world_width, self.world_height - v * self.world_height)
    }
}

/// Clamp each component of `p` into `[min, max]`, collapsing to the midpoint when the
/// range is inverted.
#[inline]
pub fn clamp_to_box(p: Vec2, min: Vec2, max: Vec2) -> Vec2 {
    let clamp_axis = |v: f32, lo: f32, hi: f32| {
        if lo > hi { 0.5 * (lo + hi) } else { v.clamp(lo, hi) }
    };
    Vec2::new(clamp_axis(p.x, min.x, max.x), clamp_axis(p.y, min.y, max.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_angle_stays_in_half_open_range() {
        for &a in &[0.0f32, 1.0, -1.0, 3.0, -3.0, 7.0, -7.0, 100.0, -100.0] {
            let w = wrap_angle(a);
            assert!(w > -PI - 1.0e-6 && w <= PI + 1.0e-6, "{a} wrapped to {w}");
            // Same direction as the input.
            assert!((w.sin() - a.sin()).abs() < 1.0e-3);
            assert!((w.cos() - a.cos()).abs() < 1.0e-3);
        }
    }

    #[test]
    fn minus_pi_folds_onto_plus_pi() {
        assert!((wrap_angle(-PI) - PI).abs() < 1.0e-6);
        assert!((wrap_angle(PI) - PI).abs() < 1.0e-6);
    }

    #[test]
    fn in_range_angles_are_untouched() {
        for &a in &[0.3f32, -1.1, 2.9, -3.1, PI] {
            assert_eq!(wrap_angle(a), a);
        }
    }

    #[test]
    fn angle_delta_takes_the_short_way_round() {
        let d = angle_delta(3.0, -3.0);
        assert!((d - (TAU - 6.0)).abs() < 1.0e-5, "delta was {d}");

        let d = angle_delta(-3.0, 3.0);
        assert!((d + (TAU - 6.0)).abs() < 1.0e-5, "delta was {d}");
    }

    #[test]
    fn orientation_between_follows_atan2_convention() {
        let origin = Vec2::new(10.0, 10.0);
        let east = orientation_between(origin, Vec2::new(20.0, 10.0)).unwrap();
        let north = orientation_between(origin, Vec2::new(10.0, 20.0)).unwrap();
        let west = orientation_between(origin, Vec2::new(0.0, 10.0)).unwrap();

        assert!(east.abs() < 1.0e-6);
        assert!((north - PI / 2.0).abs() < 1.0e-6);
        assert!((west - PI).abs() < 1.0e-6);
        assert!(orientation_between(origin, origin).is_none());
    }

    #[test]
    fn frame_mapping_flips_y() {
        let m = FrameMapping::new(640.0, 480.0, 800.0, 600.0);
        let top_left = m.to_world(0.0, 0.0);
        let bottom_right = m.to_world(640.0, 480.0);

        assert!((top_left.x - 0.0).abs() < 1.0e-4);
        assert!((top_left.y - 600.0).abs() < 1.0e-4);
        assert!((bottom_right.x - 800.0).abs() < 1.0e-4);
        assert!(bottom_right.y.abs() < 1.0e-4);

        let mirrored = m.mirrored().to_world(0.0, 240.0);
        assert!((mirrored.x - 800.0).abs() < 1.0e-4);
        assert!((mirrored.y - 300.0).abs() < 1.0e-4);
    }

    #[test]
    fn clamp_to_box_handles_inverted_ranges() {
        let p = clamp_to_box(
            Vec2::new(-5.0, 900.0),
            Vec2::new(50.0, 50.0),
            Vec2::new(750.0, 550.0),
        );
        assert_eq!(p, Vec2::new(50.0, 550.0));

        let p = clamp_to_box(Vec2::new(1.0, 1.0), Vec2::new(60.0, 0.0), Vec2::new(40.0, 10.0));
        assert_eq!(p, Vec2::new(50.0, 1.0));
    }
}
