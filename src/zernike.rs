//! Zernike polynomial basis on the unit disk, indexed by the ANSI single
//! integer `j`.
//!
//! Out of scope per spec.md §1 ("specified only by the values it must
//! produce"); this module exists so [`crate::em::ZernikePhaseScreen`] and
//! its tests have a concrete basis to drive, without committing to a full
//! polynomial expansion.

use crate::core::Float;

/// A Zernike-indexed orthonormal basis on the unit disk. `value`, `d_rho`
/// and `d_theta` are all evaluated at normalized radius `rho in [0,1]` and
/// angle `theta` in radians.
pub trait ZernikeBasis: std::fmt::Debug + Send + Sync {
    fn value(&self, j: usize, rho: Float, theta: Float) -> Float;
    fn d_rho(&self, j: usize, rho: Float, theta: Float) -> Float;
    fn d_theta(&self, j: usize, rho: Float, theta: Float) -> Float;
}

/// Computes `j = 0` (piston), `j = 1` (x-tilt) and `j = 2` (y-tilt)
/// analytically; any higher index falls back to a small lookup table of
/// additional low-order terms (`j = 3` defocus, `j = 4..5` astigmatism),
/// and is zero beyond that rather than guessing at an unimplemented
/// polynomial.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardZernikeBasis;

impl ZernikeBasis for StandardZernikeBasis {
    fn value(&self, j: usize, rho: Float, theta: Float) -> Float {
        match j {
            0 => 1.0,
            1 => 2.0 * rho * theta.cos(),
            2 => 2.0 * rho * theta.sin(),
            3 => (3.0f64).sqrt() * (2.0 * rho * rho - 1.0),
            4 => (6.0f64).sqrt() * rho * rho * (2.0 * theta).sin(),
            5 => (6.0f64).sqrt() * rho * rho * (2.0 * theta).cos(),
            _ => 0.0,
        }
    }

    fn d_rho(&self, j: usize, rho: Float, theta: Float) -> Float {
        match j {
            0 => 0.0,
            1 => 2.0 * theta.cos(),
            2 => 2.0 * theta.sin(),
            3 => (3.0f64).sqrt() * 4.0 * rho,
            4 => (6.0f64).sqrt() * 2.0 * rho * (2.0 * theta).sin(),
            5 => (6.0f64).sqrt() * 2.0 * rho * (2.0 * theta).cos(),
            _ => 0.0,
        }
    }

    fn d_theta(&self, j: usize, rho: Float, theta: Float) -> Float {
        match j {
            0 | 3 => 0.0,
            1 => -2.0 * rho * theta.sin(),
            2 => 2.0 * rho * theta.cos(),
            4 => (6.0f64).sqrt() * rho * rho * 2.0 * (2.0 * theta).cos(),
            5 => -((6.0f64).sqrt()) * rho * rho * 2.0 * (2.0 * theta).sin(),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_piston_is_constant() {
        let basis = StandardZernikeBasis;
        assert_eq!(basis.value(0, 0.3, 1.2), 1.0);
        assert_eq!(basis.d_rho(0, 0.3, 1.2), 0.0);
        assert_eq!(basis.d_theta(0, 0.3, 1.2), 0.0);
    }

    #[test]
    fn test_tilt_matches_cartesian_projection() {
        let basis = StandardZernikeBasis;
        let rho = 0.5;
        let theta = 0.0;
        // Z1 = 2 rho cos(theta) = 2x/R when theta = 0, x = rho*R.
        assert!((basis.value(1, rho, theta) - 2.0 * rho).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_index_is_zero() {
        let basis = StandardZernikeBasis;
        assert_eq!(basis.value(99, 0.5, 0.5), 0.0);
    }
}
