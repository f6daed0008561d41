use std::sync::Arc;

use super::{refract, EMInterface};
use crate::beam::RayBeam;
use crate::core::math::Vec3;
use crate::core::{Float, GEOM_ZERO_TOL};
use crate::zernike::ZernikeBasis;

/// A Zernike expansion `Z(x,y) = sum_i a_i Z_i(x/R, y/R)` treated as an
/// equivalent surface height, whose local gradient tilts the refraction
/// normal (spec.md §4.3).
#[derive(Debug, Clone)]
pub struct ZernikePhaseScreen {
    coeffs: Vec<(usize, Float)>,
    aperture_radius: Float,
    index_out: Float,
    basis: Arc<dyn ZernikeBasis>,
}

impl ZernikePhaseScreen {
    pub fn new(
        coeffs: Vec<(usize, Float)>,
        aperture_radius: Float,
        index_out: Float,
        basis: Arc<dyn ZernikeBasis>,
    ) -> Self {
        Self {
            coeffs,
            aperture_radius,
            index_out,
            basis,
        }
    }

    /// Cartesian gradient `(dZ/dx, dZ/dy)` of the phase screen at physical
    /// local coordinates `(x, y)`, obtained from the basis's polar partials
    /// via the chain rule `rho = r/R`, `theta = atan2(y, x)`.
    fn gradient(&self, x: Float, y: Float) -> (Float, Float) {
        let r = (x * x + y * y).sqrt();
        if r < GEOM_ZERO_TOL {
            return (0.0, 0.0);
        }
        let rho = r / self.aperture_radius;
        let theta = y.atan2(x);
        let (cos_t, sin_t) = (theta.cos(), theta.sin());

        let d_rho_dx = cos_t / self.aperture_radius;
        let d_rho_dy = sin_t / self.aperture_radius;
        let d_theta_dx = -sin_t / r;
        let d_theta_dy = cos_t / r;

        let mut dzdx = 0.0;
        let mut dzdy = 0.0;
        for &(j, a) in &self.coeffs {
            let dz_drho = self.basis.d_rho(j, rho, theta);
            let dz_dtheta = self.basis.d_theta(j, rho, theta);
            dzdx += a * (dz_drho * d_rho_dx + dz_dtheta * d_theta_dx);
            dzdy += a * (dz_drho * d_rho_dy + dz_dtheta * d_theta_dy);
        }
        (dzdx, dzdy)
    }

    fn tilted_normal(&self, x: Float, y: Float) -> Vec3 {
        let (dzdx, dzdy) = self.gradient(x, y);
        let vx = Vec3::new(1.0, 0.0, dzdx);
        let vy = Vec3::new(0.0, 1.0, dzdy);
        vy.cross(vx).normalize()
    }
}

impl EMInterface for ZernikePhaseScreen {
    fn transmit(&self, beam: &mut RayBeam) {
        for i in 0..beam.capacity() {
            if !beam.has_ray(i) || !beam.intercepted(i) {
                continue;
            }
            let p = beam.destination(i);
            let mut n = self.tilted_normal(p.x(), p.y());
            let v = beam.direction(i);
            if n.dot(v) > 0.0 {
                n = -n;
            }
            let mu = beam.ref_ndx(i) / self.index_out;
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
    use crate::core::math::Complex;
    use crate::zernike::StandardZernikeBasis;

    #[test]
    fn test_flat_screen_with_zero_coeffs_behaves_like_flat_dielectric() {
        let screen = ZernikePhaseScreen::new(vec![], 1.0, 1.5, Arc::new(StandardZernikeBasis));
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
        beam.set_destination(0, Vec3::new(0.1, 0.0, 0.0));
        screen.transmit(&mut beam);
        assert!(beam.direction(0).approx_eq(&Vec3::new(0.0, 0.0, -1.0), 1e-9));
    }

    #[test]
    fn test_tilt_term_bends_normal_incidence_ray() {
        let screen = ZernikePhaseScreen::new(
            vec![(1, 0.5)],
            1.0,
            1.5,
            Arc::new(StandardZernikeBasis),
        );
        let ray = Ray {
            origin: Vec3::new(0.1, 0.0, 1.0),
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
        beam.set_destination(0, Vec3::new(0.1, 0.0, 0.0));
        screen.transmit(&mut beam);
        assert!(beam.direction(0).x().abs() > 1e-6);
    }
}
