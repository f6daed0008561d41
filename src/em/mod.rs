//! EM interfaces: the electromagnetic half of a medium boundary. Each
//! interface mutates a beam's directions, refractive index and amplitude
//! for the rays a surface shape has already marked intercepted, and may
//! additionally prune rays (spec.md §4.3).

mod dielectric;
mod dummy;
mod paraxial;
mod phase_screen;
mod reflective;
mod transmission;

pub use dielectric::Dielectric;
pub use dummy::Dummy;
pub use paraxial::Paraxial;
pub use phase_screen::ZernikePhaseScreen;
pub use reflective::Reflective;
pub use transmission::{ScalarTransmission, TransmissionMap};

use crate::beam::RayBeam;

/// The optical effect of a boundary on the rays that struck it. A call to
/// `transmit` must only touch rows for which `beam.has_ray(i) &&
/// beam.intercepted(i)`; everything else is out of scope (spec.md §4.3).
pub trait EMInterface: std::fmt::Debug + Send + Sync {
    fn transmit(&self, beam: &mut RayBeam);
}

/// Refracts unit direction `v` through a boundary with outward-oriented
/// normal `n` and index ratio `mu = n_incident / n_transmitted`, following
/// the vector form of Snell's law in spec.md §4.3. Returns `None` on total
/// internal reflection.
pub(crate) fn refract(
    v: crate::core::math::Vec3,
    n: crate::core::math::Vec3,
    mu: crate::core::Float,
) -> Option<crate::core::math::Vec3> {
    let cos_i = -n.dot(v);
    let sin_t2 = mu * mu * (1.0 - cos_i * cos_i).max(0.0);
    if sin_t2 > 1.0 {
        return None;
    }
    let cos_t = (1.0 - sin_t2).sqrt();
    Some((v * mu + n * (mu * cos_i - cos_t)).normalize())
}

/// Reflects unit direction `v` off a boundary with outward-oriented normal
/// `n`: `v - 2(v.n)n` (spec.md §4.3).
pub(crate) fn reflect(
    v: crate::core::math::Vec3,
    n: crate::core::math::Vec3,
) -> crate::core::math::Vec3 {
    v - n * (2.0 * v.dot(n))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::math::Vec3;

    #[test]
    fn test_reflect_normal_incidence_reverses_direction() {
        let v = Vec3::new(0.0, 0.0, -1.0);
        let n = Vec3::new(0.0, 0.0, 1.0);
        let r = reflect(v, n);
        assert!(r.approx_eq(&Vec3::new(0.0, 0.0, 1.0), 1e-12));
    }

    #[test]
    fn test_refract_normal_incidence_is_unbent() {
        let v = Vec3::new(0.0, 0.0, -1.0);
        let n = Vec3::new(0.0, 0.0, 1.0);
        let out = refract(v, n, 1.0 / 1.5).unwrap();
        assert!(out.approx_eq(&v, 1e-12));
    }

    #[test]
    fn test_refract_total_internal_reflection_is_none() {
        let v = Vec3::new((80f64).to_radians().sin(), 0.0, -(80f64).to_radians().cos());
        let n = Vec3::new(0.0, 0.0, 1.0);
        // Going from dense (1.5) to rare (1.0) medium at a steep angle: TIR.
        assert!(refract(v, n, 1.5 / 1.0).is_none());
    }
}
