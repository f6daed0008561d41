//! The Tripod frame algorithm: three leg lengths on an isoceles base
//! triangle define a tilted surface. Grounded on `TripodFrame.cpp` in the
//! original C++ optomechanical library this crate's recipe model descends
//! from.

use crate::core::math::{Mat3, Vec3};
use crate::core::{Float, GEOM_ZERO_TOL};

/// Computes the three base anchor points of the tripod's supporting
/// triangle, at radius `radius` from the local z-axis in the z=0 plane.
/// `angle` is the vertex angle at anchor 0 between the two adjacent sides;
/// the remaining two anchors are placed symmetrically about the x-axis.
fn base_points(radius: Float, angle: Float) -> [Vec3; 3] {
    let half = angle / 2.0;
    [
        Vec3::new(radius, 0.0, 0.0),
        Vec3::new(radius * half.cos(), radius * half.sin(), 0.0),
        Vec3::new(radius * half.cos(), -radius * half.sin(), 0.0),
    ]
}

/// Circumcenter of the triangle (a, b, c), expressed relative to `c`.
///
/// `a = A - C`, `b = B - C`; the circumcenter lies at
/// `C + ((|b|^2 a - |a|^2 b) x (a x b)) / (2 |a x b|^2)`.
fn circumcenter(a: Vec3, b: Vec3, c: Vec3) -> Option<Vec3> {
    let cross_ab = a.cross(b);
    let denom = 2.0 * cross_ab.length_squared();
    if denom < GEOM_ZERO_TOL {
        return None;
    }
    let numerator = (a * b.length_squared() - b * a.length_squared()).cross(cross_ab);
    Some(c + numerator / denom)
}

/// Solves for the tripod frame's center and orientation, both expressed
/// relative to the parent frame. Returns `None` on a degenerate
/// (colinear) triangle, in which case the caller must retain the previous
/// frame state per spec.md's failure semantics.
pub(super) fn solve(radius: Float, angle: Float, legs: [Float; 3]) -> Option<(Vec3, Mat3)> {
    let base = base_points(radius, angle);
    let p = [
        Vec3::new(base[0].x(), base[0].y(), legs[0]),
        Vec3::new(base[1].x(), base[1].y(), legs[1]),
        Vec3::new(base[2].x(), base[2].y(), legs[2]),
    ];

    let v1 = p[0] - p[2];
    let v2 = p[1] - p[2];
    let normal = v1.cross(v2);
    if normal.length_squared() < GEOM_ZERO_TOL {
        return None;
    }
    let n_t = normal.normalize();

    let ez = Vec3::unit_z();
    let k = -ez.cross(n_t);
    let cos_theta = n_t.dot(ez);
    let orientation = Mat3::identity() * cos_theta + Mat3::cross_matrix(k);

    let center = circumcenter(v1, v2, p[2])?;
    Some((center, orientation))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_flat_legs_give_identity_orientation() {
        let (center, orientation) = solve(1.0, std::f64::consts::FRAC_PI_3 * 2.0, [0.0, 0.0, 0.0])
            .expect("equal-length legs on a non-degenerate base must solve");
        assert!(orientation.approx_eq(&Mat3::identity(), 1e-9));
        assert!(center.approx_eq(&Vec3::zero(), 1e-9));
    }

    #[test]
    fn test_colinear_legs_are_degenerate() {
        // A zero-radius base collapses all three anchor points onto the
        // z-axis, which is always colinear regardless of leg lengths.
        assert!(solve(0.0, std::f64::consts::FRAC_PI_3 * 2.0, [0.0, 1.0, 2.0]).is_none());
    }

    #[test]
    fn test_tilted_legs_produce_nonzero_center_z() {
        let (center, _) = solve(1.0, std::f64::consts::FRAC_PI_3 * 2.0, [0.0, 0.1, 0.2])
            .expect("asymmetric legs on a non-degenerate base must solve");
        assert!(center.z() > 0.0);
    }
}
