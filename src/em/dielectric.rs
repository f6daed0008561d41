use super::{refract, EMInterface};
use crate::beam::RayBeam;
use crate::core::Float;

/// A refracting boundary following Snell's law in vector form. On total
/// internal reflection the ray is pruned (spec.md §4.3, §7).
#[derive(Debug, Clone, Copy)]
pub struct Dielectric {
    /// Refractive index of the medium the ray is transmitted into.
    pub index_out: Float,
}

impl Dielectric {
    pub fn new(index_out: Float) -> Self {
        Self { index_out }
    }
}

impl EMInterface for Dielectric {
    fn transmit(&self, beam: &mut RayBeam) {
        for i in 0..beam.capacity() {
            if !beam.has_ray(i) || !beam.intercepted(i) {
                continue;
            }
            let n_in = beam.ref_ndx(i);
            let mu = n_in / self.index_out;
            let v = beam.direction(i);
            let n = beam.normal(i);
            match refract(v, n, mu) {
                Some(out) => {
                    beam.set_direction(i, out);
                    beam.set_ref_ndx(i, self.index_out);
                }
                None => beam.prune(i),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::beam::Ray;
    use crate::core::math::{Complex, Vec3};

    fn normal_incidence_beam() -> RayBeam {
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 1.0),
            direction: Vec3::new(0.0, 0.0, -1.0),
            length: 0.0,
            cum_opt_length: 0.0,
            ref_ndx: 1.0,
            wavelength: 0.55,
            amplitude: Complex::one(),
            id: 0,
            intercepted: true,
            chief: false,
        };
        let mut beam = RayBeam::new(&[ray], 1, false);
        beam.set_normal(0, Vec3::unit_z());
        beam
    }

    #[test]
    fn test_normal_incidence_is_unbent_and_updates_index() {
        let mut beam = normal_incidence_beam();
        Dielectric::new(1.5).transmit(&mut beam);
        assert!(beam.has_ray(0));
        assert!(beam.direction(0).approx_eq(&Vec3::new(0.0, 0.0, -1.0), 1e-12));
        assert_eq!(beam.ref_ndx(0), 1.5);
    }

    #[test]
    fn test_total_internal_reflection_prunes_ray() {
        let ray = Ray {
            origin: Vec3::new(2.0, 0.0, 1.0),
            direction: Vec3::new((80f64).to_radians().sin(), 0.0, -(80f64).to_radians().cos()),
            length: 0.0,
            cum_opt_length: 0.0,
            ref_ndx: 1.5,
            wavelength: 0.55,
            amplitude: Complex::one(),
            id: 0,
            intercepted: true,
            chief: false,
        };
        let mut beam = RayBeam::new(&[ray], 1, false);
        beam.set_normal(0, Vec3::unit_z());
        Dielectric::new(1.0).transmit(&mut beam);
        assert!(!beam.has_ray(0));
    }
}
