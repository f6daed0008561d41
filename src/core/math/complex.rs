/// A minimal complex scalar used to carry ray amplitude through the
/// tracing engine (phase and attenuation), not as a general-purpose
/// numerics type.
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::core::Float;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Complex<T = Float> {
    pub real: T,
    pub imag: T,
}

impl Complex<Float> {
    pub fn new(real: Float, imag: Float) -> Self {
        Self { real, imag }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn one() -> Self {
        Self::new(1.0, 0.0)
    }

    /// A unit-amplitude phasor with the given phase, in radians.
    pub fn from_phase(phase: Float) -> Self {
        Self::new(phase.cos(), phase.sin())
    }

    pub fn conj(&self) -> Self {
        Self::new(self.real, -self.imag)
    }

    pub fn modulus_squared(&self) -> Float {
        self.real * self.real + self.imag * self.imag
    }

    pub fn modulus(&self) -> Float {
        self.modulus_squared().sqrt()
    }

    /// Irradiance contribution of this amplitude, i.e. `self * conj(self)`,
    /// returned as a real scalar since the imaginary part is always zero.
    pub fn intensity(&self) -> Float {
        self.modulus_squared()
    }

    pub fn phase(&self) -> Float {
        self.imag.atan2(self.real)
    }
}

impl Add for Complex<Float> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.real + rhs.real, self.imag + rhs.imag)
    }
}

impl Sub for Complex<Float> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.real - rhs.real, self.imag - rhs.imag)
    }
}

impl Mul for Complex<Float> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.real * rhs.real - self.imag * rhs.imag,
            self.real * rhs.imag + self.imag * rhs.real,
        )
    }
}

impl Mul<Float> for Complex<Float> {
    type Output = Self;

    fn mul(self, rhs: Float) -> Self {
        Self::new(self.real * rhs, self.imag * rhs)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_modulus_of_unit_phasor_is_one() {
        let c = Complex::from_phase(1.23);
        assert!((c.modulus() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_conj_cancels_imaginary_part() {
        let c = Complex::new(2.0, 3.0);
        let intensity = (c * c.conj()).real;
        assert!((intensity - c.modulus_squared()).abs() < 1e-12);
        assert_eq!((c * c.conj()).imag, 0.0);
    }

    #[test]
    fn test_phase_round_trip() {
        let phase = 0.7;
        let c = Complex::from_phase(phase);
        assert!((c.phase() - phase).abs() < 1e-12);
    }
}
