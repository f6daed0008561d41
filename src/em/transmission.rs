use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;

use super::EMInterface;
use crate::beam::RayBeam;
use crate::core::Float;

thread_local! {
    static RNG: RefCell<SmallRng> = RefCell::new(SmallRng::from_entropy());
}

fn roll() -> Float {
    RNG.with(|rng| rng.borrow_mut().gen_range(0.0..1.0))
}

/// A `width x height` grid of per-pixel transmittances, stored row-major
/// with a stride (in cells) that may exceed `width`. Values outside
/// `[0, 1]` are clamped on lookup (spec.md §4.3).
#[derive(Debug, Clone)]
pub struct TransmissionMap {
    width: usize,
    height: usize,
    stride: usize,
    /// Physical extent of the map in the surface's local x/y plane.
    extent: (Float, Float),
    data: Vec<Float>,
}

impl TransmissionMap {
    pub fn new(width: usize, height: usize, stride: usize, extent: (Float, Float), data: Vec<Float>) -> Self {
        assert!(stride >= width, "stride must be at least as large as width");
        assert_eq!(data.len(), stride * height, "data length must match stride * height");
        Self {
            width,
            height,
            stride,
            extent,
            data,
        }
    }

    fn lookup(&self, x: Float, y: Float) -> Float {
        let (ew, eh) = self.extent;
        let u = ((x / ew + 0.5) * self.width as Float) as isize;
        let v = ((y / eh + 0.5) * self.height as Float) as isize;
        let u = u.clamp(0, self.width as isize - 1) as usize;
        let v = v.clamp(0, self.height as isize - 1) as usize;
        self.data[v * self.stride + u].clamp(0.0, 1.0)
    }
}

impl EMInterface for TransmissionMap {
    fn transmit(&self, beam: &mut RayBeam) {
        for i in 0..beam.capacity() {
            if !beam.has_ray(i) || !beam.intercepted(i) {
                continue;
            }
            let p = beam.destination(i);
            let tau = self.lookup(p.x(), p.y());
            if roll() > tau {
                beam.prune(i);
            }
        }
    }
}

/// A uniform transmission coefficient. `tau = 0` absorbs every intercepted
/// ray; `tau = 1` is transparent (spec.md §4.3).
#[derive(Debug, Clone, Copy)]
pub struct ScalarTransmission {
    pub tau: Float,
}

impl ScalarTransmission {
    pub fn new(tau: Float) -> Self {
        Self { tau: tau.clamp(0.0, 1.0) }
    }
}

impl EMInterface for ScalarTransmission {
    fn transmit(&self, beam: &mut RayBeam) {
        if self.tau >= 1.0 {
            return;
        }
        for i in 0..beam.capacity() {
            if !beam.has_ray(i) || !beam.intercepted(i) {
                continue;
            }
            if self.tau <= 0.0 || roll() > self.tau {
                beam.prune(i);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::beam::Ray;
    use crate::core::math::{Complex, Vec3};

    fn ray_at(x: Float, y: Float) -> Ray {
        Ray {
            origin: Vec3::new(x, y, 1.0),
            direction: Vec3::new(0.0, 0.0, -1.0),
            length: 0.0,
            cum_opt_length: 0.0,
            ref_ndx: 1.0,
            wavelength: 0.55,
            amplitude: Complex::one(),
            id: 0,
            intercepted: true,
            chief: false,
        }
    }

    #[test]
    fn test_scalar_transmission_zero_prunes_everything() {
        let mut beam = RayBeam::new(&[ray_at(0.0, 0.0), ray_at(0.1, 0.1)], 2, false);
        ScalarTransmission::new(0.0).transmit(&mut beam);
        assert!(!beam.has_ray(0));
        assert!(!beam.has_ray(1));
    }

    #[test]
    fn test_scalar_transmission_one_is_transparent() {
        let mut beam = RayBeam::new(&[ray_at(0.0, 0.0), ray_at(0.1, 0.1)], 2, false);
        ScalarTransmission::new(1.0).transmit(&mut beam);
        assert!(beam.has_ray(0));
        assert!(beam.has_ray(1));
    }

    #[test]
    fn test_transmission_map_clamps_out_of_range_values() {
        let map = TransmissionMap::new(2, 1, 2, (2.0, 2.0), vec![-1.0, 2.0]);
        assert_eq!(map.lookup(-0.9, 0.0), 0.0);
        assert_eq!(map.lookup(0.9, 0.0), 1.0);
    }
}
