use super::{Intercept, Sample, SurfaceShape, orient_normal};
use crate::core::math::Vec3;
use crate::core::{Float, GEOM_ZERO_TOL, PI};

/// A flat circular (or elliptical, via `eccentricity`) aperture in the
/// surface's local z=0 plane.
#[derive(Debug, Clone, Copy)]
pub struct CircularFlat {
    radius: Float,
    /// Semi-axis scale factors with `a * b == 1`, so that the aperture area
    /// stays `pi * radius^2` regardless of eccentricity.
    a: Float,
    b: Float,
    complementary: bool,
}

impl CircularFlat {
    pub fn new(radius: Float, eccentricity: Float, complementary: bool) -> Self {
        assert!(
            (0.0..1.0).contains(&eccentricity),
            "eccentricity must lie in [0, 1)"
        );
        let k = (1.0 - eccentricity * eccentricity).sqrt();
        let a = 1.0 / k.sqrt();
        let b = k.sqrt();
        Self {
            radius,
            a,
            b,
            complementary,
        }
    }

    pub fn radius(&self) -> Float {
        self.radius
    }

    fn contains(&self, x: Float, y: Float) -> bool {
        let semi_a = self.radius * self.a;
        let semi_b = self.radius * self.b;
        let inside = (x * x) / (semi_a * semi_a) + (y * y) / (semi_b * semi_b) <= 1.0;
        inside != self.complementary
    }
}

impl SurfaceShape for CircularFlat {
    fn intercept(&self, origin: Vec3, direction: Vec3) -> Option<Intercept> {
        if direction.z().abs() < GEOM_ZERO_TOL {
            return None;
        }
        let t = -origin.z() / direction.z();
        if t <= 0.0 {
            return None;
        }
        let point = origin + direction * t;
        if !self.contains(point.x(), point.y()) {
            return None;
        }
        let normal = orient_normal(Vec3::unit_z(), direction);
        Some(Intercept { point, normal, t })
    }

    fn area(&self) -> Float {
        PI * self.radius * self.radius
    }

    fn complementary(&self) -> bool {
        self.complementary
    }

    fn sample(&self, n: usize) -> Vec<Sample> {
        let spacing = (self.area() / n.max(1) as Float).sqrt();
        Vec3::sq_grid_in_circ(self.radius, spacing, 0.0, 0.0, 0.0)
            .into_iter()
            .map(|point| Sample {
                point,
                normal: Vec3::unit_z(),
            })
            .collect()
    }

    fn edges(&self) -> Vec<Vec<Vec3>> {
        let n = 64;
        let points = (0..=n)
            .map(|i| {
                let theta = 2.0 * PI * i as Float / n as Float;
                Vec3::new(
                    self.radius * self.a * theta.cos(),
                    self.radius * self.b * theta.sin(),
                    0.0,
                )
            })
            .collect();
        vec![points]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shapes::test_support::assert_hits_center_from_above;

    #[test]
    fn test_hits_center_from_above() {
        let shape = CircularFlat::new(1.0, 0.0, false);
        assert_hits_center_from_above(&shape, 1.0);
    }

    #[test]
    fn test_misses_outside_radius() {
        let shape = CircularFlat::new(1.0, 0.0, false);
        let origin = Vec3::new(2.0, 0.0, 1.0);
        let direction = Vec3::new(0.0, 0.0, -1.0);
        assert!(shape.intercept(origin, direction).is_none());
    }

    #[test]
    fn test_circular_aperture_area_independent_of_eccentricity() {
        let a = CircularFlat::new(2.0, 0.0, false);
        let b = CircularFlat::new(2.0, 0.5, false);
        assert!((a.area() - b.area()).abs() < 1e-12);
    }

    #[test]
    fn test_complementary_inverts_containment() {
        let shape = CircularFlat::new(1.0, 0.0, true);
        let origin = Vec3::new(0.0, 0.0, 1.0);
        let direction = Vec3::new(0.0, 0.0, -1.0);
        assert!(shape.intercept(origin, direction).is_none());

        let origin_outside = Vec3::new(2.0, 0.0, 1.0);
        assert!(shape.intercept(origin_outside, direction).is_some());
    }
}
