use super::{Intercept, Sample, SurfaceShape, orient_normal};
use crate::core::math::Vec3;
use crate::core::{Float, GEOM_ZERO_TOL};

/// A flat rectangular aperture, `|x| <= width/2 && |y| <= height/2`, in the
/// surface's local z=0 plane.
#[derive(Debug, Clone, Copy)]
pub struct RectangularFlat {
    width: Float,
    height: Float,
    complementary: bool,
}

impl RectangularFlat {
    pub fn new(width: Float, height: Float, complementary: bool) -> Self {
        Self {
            width,
            height,
            complementary,
        }
    }

    fn contains(&self, x: Float, y: Float) -> bool {
        let inside = x.abs() <= self.width / 2.0 && y.abs() <= self.height / 2.0;
        inside != self.complementary
    }
}

impl SurfaceShape for RectangularFlat {
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
        self.width * self.height
    }

    fn complementary(&self) -> bool {
        self.complementary
    }

    fn sample(&self, n: usize) -> Vec<Sample> {
        let per_axis = (n.max(1) as Float).sqrt().ceil() as usize;
        let mut samples = Vec::with_capacity(per_axis * per_axis);
        for i in 0..per_axis {
            for j in 0..per_axis {
                let x = -self.width / 2.0 + self.width * (i as Float + 0.5) / per_axis as Float;
                let y = -self.height / 2.0 + self.height * (j as Float + 0.5) / per_axis as Float;
                samples.push(Sample {
                    point: Vec3::new(x, y, 0.0),
                    normal: Vec3::unit_z(),
                });
            }
        }
        samples
    }

    fn edges(&self) -> Vec<Vec<Vec3>> {
        let (hw, hh) = (self.width / 2.0, self.height / 2.0);
        vec![vec![
            Vec3::new(-hw, -hh, 0.0),
            Vec3::new(hw, -hh, 0.0),
            Vec3::new(hw, hh, 0.0),
            Vec3::new(-hw, hh, 0.0),
            Vec3::new(-hw, -hh, 0.0),
        ]]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shapes::test_support::assert_hits_center_from_above;

    #[test]
    fn test_hits_center_from_above() {
        let shape = RectangularFlat::new(2.0, 1.0, false);
        assert_hits_center_from_above(&shape, 1.0);
    }

    #[test]
    fn test_misses_outside_bounds() {
        let shape = RectangularFlat::new(2.0, 1.0, false);
        let origin = Vec3::new(0.0, 1.0, 1.0);
        let direction = Vec3::new(0.0, 0.0, -1.0);
        assert!(shape.intercept(origin, direction).is_none());
    }

    #[test]
    fn test_area() {
        let shape = RectangularFlat::new(2.0, 3.0, false);
        assert_eq!(shape.area(), 6.0);
    }
}
