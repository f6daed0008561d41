use super::EMInterface;
use crate::beam::RayBeam;
use crate::core::Float;

/// An ideal thin lens: redirects a ray so that the paraxial thin-lens
/// transfer `angle_out = angle_in - height / f` is satisfied, which for a
/// collimated input beam converges every ray toward the focal point `f*z`
/// in the surface frame (spec.md §4.3).
#[derive(Debug, Clone, Copy)]
pub struct Paraxial {
    pub focal_length: Float,
}

impl Paraxial {
    pub fn new(focal_length: Float) -> Self {
        Self { focal_length }
    }
}

impl EMInterface for Paraxial {
    fn transmit(&self, beam: &mut RayBeam) {
        for i in 0..beam.capacity() {
            if !beam.has_ray(i) || !beam.intercepted(i) {
                continue;
            }
            let p = beam.destination(i);
            let v = beam.direction(i);
            let out = crate::core::math::Vec3::new(
                v.x() - p.x() / self.focal_length,
                v.y() - p.y() / self.focal_length,
                v.z(),
            )
            .normalize();
            beam.set_direction(i, out);
        }
    }
}
