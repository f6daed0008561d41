use super::{Intercept, Sample, SurfaceShape, orient_normal};
use crate::core::math::Vec3;
use crate::core::{Float, GEOM_ZERO_TOL};

/// A conic surface of revolution: sphere (`K=0`), parabola (`K=-1`),
/// hyperbola (`K<-1`) or oblate ellipsoid (`K>0`), with an annular aperture
/// and an optional central hole.
#[derive(Debug, Clone, Copy)]
pub struct Conic {
    radius_of_curvature: Float,
    conic_constant: Float,
    aperture_radius: Float,
    hole_radius: Float,
    center_offset: (Float, Float),
    /// `+1.0` for convex, `-1.0` for concave, following spec.md's
    /// convexity-flag convention.
    convexity: Float,
    complementary: bool,
    /// Sag at the aperture edge, precomputed so the vertex sits at the
    /// rim plane rather than at the frame's z=0 origin.
    depth: Float,
}

impl Conic {
    pub fn new(
        radius_of_curvature: Float,
        conic_constant: Float,
        aperture_radius: Float,
        hole_radius: Float,
        center_offset: (Float, Float),
        convex: bool,
        complementary: bool,
    ) -> Self {
        let mut shape = Self {
            radius_of_curvature,
            conic_constant,
            aperture_radius,
            hole_radius,
            center_offset,
            convexity: if convex { 1.0 } else { -1.0 },
            complementary,
            depth: 0.0,
        };
        shape.recalc_distribution();
        shape
    }

    fn k1(&self) -> Float {
        self.conic_constant + 1.0
    }

    /// Recomputes `depth`, the unsigned sag of the surface at the aperture
    /// rim, used to place the surface vertex relative to the frame origin.
    /// Must be re-run whenever `radius_of_curvature`, `conic_constant` or
    /// `aperture_radius` change.
    fn recalc_distribution(&mut self) {
        let k1 = self.k1();
        let r = self.aperture_radius;
        self.depth = if k1.abs() < GEOM_ZERO_TOL {
            r * r / (2.0 * self.radius_of_curvature)
        } else {
            let under_root = self.radius_of_curvature * self.radius_of_curvature - k1 * r * r;
            (self.radius_of_curvature - under_root.max(0.0).sqrt()) / k1
        };
    }

    fn sag(&self, r2: Float) -> Float {
        let k1 = self.k1();
        let unsigned = if k1.abs() < GEOM_ZERO_TOL {
            r2 / (2.0 * self.radius_of_curvature)
        } else {
            let under_root = self.radius_of_curvature * self.radius_of_curvature - k1 * r2;
            (self.radius_of_curvature - under_root.max(0.0).sqrt()) / k1
        };
        self.convexity * (unsigned - self.depth)
    }

    fn contains(&self, x: Float, y: Float) -> bool {
        let (cx, cy) = self.center_offset;
        let r2 = (x - cx) * (x - cx) + (y - cy) * (y - cy);
        let hole2 = self.hole_radius * self.hole_radius;
        let ap2 = self.aperture_radius * self.aperture_radius;
        let inside = r2 >= hole2 && r2 <= ap2;
        inside != self.complementary
    }

    fn normal_at(&self, x: Float, y: Float) -> Vec3 {
        let (cx, cy) = self.center_offset;
        let (dx, dy) = (x - cx, y - cy);
        let k1 = self.k1();
        let r2 = dx * dx + dy * dy;
        let (gx, gy) = if k1.abs() < GEOM_ZERO_TOL {
            (
                -self.convexity * dx / self.radius_of_curvature,
                -self.convexity * dy / self.radius_of_curvature,
            )
        } else {
            let under_root =
                (self.radius_of_curvature * self.radius_of_curvature - k1 * r2).max(GEOM_ZERO_TOL);
            let denom = under_root.sqrt();
            (
                -self.convexity * dx / denom,
                -self.convexity * dy / denom,
            )
        };
        Vec3::new(gx, gy, 1.0).normalize()
    }
}

impl SurfaceShape for Conic {
    fn intercept(&self, origin: Vec3, direction: Vec3) -> Option<Intercept> {
        let (cx, cy) = self.center_offset;
        let (ox, oy, oz) = (origin.x() - cx, origin.y() - cy, origin.z());
        let (a, b, c) = (direction.x(), direction.y(), direction.z());
        let k1 = self.k1();
        let rdkd = self.radius_of_curvature - self.depth * k1;
        let sigma = self.convexity;

        let coeff_a = a * a + b * b + k1 * c * c;
        let coeff_b = 2.0 * (a * ox + b * oy + k1 * c * oz + sigma * c * rdkd);
        let coeff_c = ox * ox + oy * oy + k1 * oz * oz + 2.0 * sigma * rdkd * oz
            - 2.0 * self.depth * self.radius_of_curvature
            + self.depth * k1 * self.depth;

        let t = if coeff_a.abs() < GEOM_ZERO_TOL {
            if coeff_b.abs() < GEOM_ZERO_TOL {
                return None;
            }
            -coeff_c / coeff_b
        } else {
            let delta = coeff_b * coeff_b - 4.0 * coeff_a * coeff_c;
            if delta < 0.0 {
                return None;
            }
            let sqrt_delta = delta.sqrt();
            let t1 = (-coeff_b + sqrt_delta) / (2.0 * coeff_a);
            let t2 = (-coeff_b - sqrt_delta) / (2.0 * coeff_a);
            if t1 > 0.0 && t2 > 0.0 {
                t1.min(t2)
            } else if t1 * t2 < 0.0 {
                t1.max(t2)
            } else {
                return None;
            }
        };

        if t <= 0.0 {
            return None;
        }

        let point = origin + direction * t;
        if !self.contains(point.x(), point.y()) {
            return None;
        }

        let normal = orient_normal(self.normal_at(point.x(), point.y()), direction);
        Some(Intercept { point, normal, t })
    }

    fn area(&self) -> Float {
        use crate::core::PI;
        PI * (self.aperture_radius * self.aperture_radius - self.hole_radius * self.hole_radius)
    }

    fn complementary(&self) -> bool {
        self.complementary
    }

    fn sample(&self, n: usize) -> Vec<Sample> {
        let spacing = (self.area().max(GEOM_ZERO_TOL) / n.max(1) as Float).sqrt();
        Vec3::sq_grid_in_circ(self.aperture_radius, spacing, 0.0, 0.0, 0.0)
            .into_iter()
            .filter(|p| self.contains(p.x(), p.y()))
            .map(|p| {
                let z = self.sag(p.x() * p.x() + p.y() * p.y());
                Sample {
                    point: Vec3::new(p.x(), p.y(), z),
                    normal: self.normal_at(p.x(), p.y()),
                }
            })
            .collect()
    }

    fn edges(&self) -> Vec<Vec<Vec3>> {
        use crate::core::PI;
        let n = 64;
        let mut outline = Vec::with_capacity(n + 1);
        for i in 0..=n {
            let theta = 2.0 * PI * i as Float / n as Float;
            let x = self.aperture_radius * theta.cos();
            let y = self.aperture_radius * theta.sin();
            let z = self.sag(x * x + y * y);
            outline.push(Vec3::new(x, y, z));
        }
        vec![outline]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shapes::test_support::assert_hits_center_from_above;

    #[test]
    fn test_sphere_hits_center_from_above() {
        let shape = Conic::new(1.0, 0.0, 0.3, 0.0, (0.0, 0.0), true, false);
        assert_hits_center_from_above(&shape, 5.0);
    }

    #[test]
    fn test_parabola_hits_center_from_above() {
        let shape = Conic::new(1.0, -1.0, 0.3, 0.0, (0.0, 0.0), true, false);
        assert_hits_center_from_above(&shape, 5.0);
    }

    #[test]
    fn test_hole_rejects_central_ray() {
        let shape = Conic::new(1.0, 0.0, 0.3, 0.05, (0.0, 0.0), true, false);
        let origin = Vec3::new(0.0, 0.0, 5.0);
        let direction = Vec3::new(0.0, 0.0, -1.0);
        assert!(shape.intercept(origin, direction).is_none());
    }

    #[test]
    fn test_vertex_lies_at_origin_for_centered_ray() {
        let shape = Conic::new(1.0, 0.0, 0.3, 0.0, (0.0, 0.0), true, false);
        let origin = Vec3::new(0.0, 0.0, 5.0);
        let direction = Vec3::new(0.0, 0.0, -1.0);
        let hit = shape.intercept(origin, direction).unwrap();
        assert!(hit.point.z().abs() < 1e-9);
    }

    #[test]
    fn test_off_axis_ray_hits_beyond_aperture_is_rejected() {
        let shape = Conic::new(1.0, 0.0, 0.3, 0.0, (0.0, 0.0), true, false);
        let origin = Vec3::new(0.5, 0.0, 5.0);
        let direction = Vec3::new(0.0, 0.0, -1.0);
        assert!(shape.intercept(origin, direction).is_none());
    }
}
