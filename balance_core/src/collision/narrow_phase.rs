use parry2d::query;

use super::broad::ColliderProxy;
use super::types::{ContactPoint, na};

/// Closest-feature contact between two proxies, if they are within `prediction` of each other.
///
/// The returned normal points from `a` toward `b`, the point lies midway between the two
/// surfaces and `dist` is negative when the shapes overlap.
pub fn contact_between(
    a: &ColliderProxy,
    b: &ColliderProxy,
    prediction: f32,
) -> Option<ContactPoint> {
    match query::contact(
        &a.iso,
        a.shape.as_shape(),
        &b.iso,
        b.shape.as_shape(),
        prediction.max(0.0),
    ) {
        Ok(Some(hit)) => Some(ContactPoint {
            a: a.owner,
            b: b.owner,
            normal: hit.normal1.into_inner(),
            point: na::center(&hit.point1, &hit.point2),
            dist: hit.dist,
        }),
        Ok(None) => None,
        Err(_) => {
            log::warn!(
                "contact query unsupported between {:?} and {:?}",
                a.owner,
                b.owner
            );
            None
        }
    }
}

/// Run the narrow phase over the broad-phase pairs.
///
/// Each pair is queried with a prediction distance of the combined motion bounds plus `skin`,
/// so a contact that can close within the step is reported before the shapes touch.
pub fn contacts_for_pairs(
    proxies: &[ColliderProxy],
    pairs: &[(usize, usize)],
    skin: f32,
) -> Vec<ContactPoint> {
    pairs
        .iter()
        .filter_map(|&(i, j)| {
            let (a, b) = (&proxies[i], &proxies[j]);
            contact_between(a, b, a.motion + b.motion + skin)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::types::{ColliderOwner, ColliderShape, Pose, Vec2};

    fn proxy(owner: ColliderOwner, shape: ColliderShape, x: f32, y: f32) -> ColliderProxy {
        ColliderProxy::new(owner, shape, Pose::new(Vec2::new(x, y), 0.0), 0.0, 0.0)
    }

    #[test]
    fn ball_above_floor_reports_positive_gap() {
        let ball = proxy(ColliderOwner::Free(0), ColliderShape::ball(10.0), 0.0, 15.0);
        let floor = proxy(
            ColliderOwner::Boundary(0),
            ColliderShape::cuboid(Vec2::new(100.0, 5.0)),
            0.0,
            0.0,
        );

        let c = contact_between(&ball, &floor, 10.0).unwrap();
        assert!((c.dist - 0.0).abs() < 1.0e-4, "dist was {}", c.dist);
        // From the ball toward the floor: straight down.
        assert!((c.normal.y + 1.0).abs() < 1.0e-4);
        assert!((c.point.y - 5.0).abs() < 1.0e-4);

        let far = proxy(ColliderOwner::Free(0), ColliderShape::ball(10.0), 0.0, 40.0);
        assert!(contact_between(&far, &floor, 10.0).is_none());
    }

    #[test]
    fn overlapping_balls_report_penetration() {
        let a = proxy(ColliderOwner::Free(0), ColliderShape::ball(10.0), 0.0, 0.0);
        let b = proxy(ColliderOwner::Free(1), ColliderShape::ball(10.0), 16.0, 0.0);

        let contacts = contacts_for_pairs(&[a, b], &[(0, 1)], 0.0);
        assert_eq!(contacts.len(), 1);
        let c = contacts[0];
        assert!((c.dist + 4.0).abs() < 1.0e-4);
        assert!((c.normal.x - 1.0).abs() < 1.0e-4);
        assert!((c.point.x - 8.0).abs() < 1.0e-4);
        assert_eq!(c.a, ColliderOwner::Free(0));
        assert_eq!(c.b, ColliderOwner::Free(1));
    }
}
