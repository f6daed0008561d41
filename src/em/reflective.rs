use super::{reflect, EMInterface};
use crate::beam::RayBeam;

/// A perfectly reflective boundary: `v <- v - 2(v.n)n`, refractive index
/// unchanged (spec.md §4.3).
#[derive(Debug, Clone, Copy, Default)]
pub struct Reflective;

impl EMInterface for Reflective {
    fn transmit(&self, beam: &mut RayBeam) {
        for i in 0..beam.capacity() {
            if !beam.has_ray(i) || !beam.intercepted(i) {
                continue;
            }
            let v = beam.direction(i);
            let n = beam.normal(i);
            beam.set_direction(i, reflect(v, n));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::beam::Ray;
    use crate::core::math::{Complex, Vec3};

    #[test]
    fn test_reflective_flips_normal_incidence() {
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
        Reflective.transmit(&mut beam);
        assert!(beam.direction(0).approx_eq(&Vec3::new(0.0, 0.0, 1.0), 1e-12));
    }
}
