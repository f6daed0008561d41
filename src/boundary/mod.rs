//! [`MediumBoundary`]: a surface shape coupled to an EM interface — the
//! unit the tracing engine steps through (spec.md §4.4).

use crate::beam::RayBeam;
use crate::core::math::Vec3;
use crate::em::EMInterface;
use crate::frame::{FrameArena, FrameId};
use crate::shapes::{Intercept, SurfaceShape};

/// A stable handle to a [`MediumBoundary`] owned elsewhere (by an
/// [`crate::element::Element`]), used to tag which surface a
/// non-sequentially-traced ray last touched (spec.md §3's `surfaces[N]`
/// column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundaryId(pub usize);

/// Couples one [`SurfaceShape`] with one (optional) [`EMInterface`]. The
/// shape handles geometry; the interface handles the optical effect
/// (spec.md §3).
#[derive(Debug)]
pub struct MediumBoundary {
    name: String,
    shape: Box<dyn SurfaceShape>,
    interface: Option<Box<dyn EMInterface>>,
    /// Tests both ray directions, used to model obstructions inside an
    /// otherwise open space (spec.md §4.4).
    reversible: bool,
}

impl MediumBoundary {
    pub fn new(
        name: impl Into<String>,
        shape: Box<dyn SurfaceShape>,
        interface: Option<Box<dyn EMInterface>>,
        reversible: bool,
    ) -> Self {
        Self {
            name: name.into(),
            shape,
            interface,
            reversible,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &dyn SurfaceShape {
        self.shape.as_ref()
    }

    pub fn reversible(&self) -> bool {
        self.reversible
    }

    pub fn interface(&self) -> Option<&dyn EMInterface> {
        self.interface.as_deref()
    }

    fn intercept(&self, origin: Vec3, direction: Vec3) -> Option<Intercept> {
        if let Some(hit) = self.shape.intercept(origin, direction) {
            return Some(hit);
        }
        if self.reversible {
            return self.shape.intercept(origin, -direction);
        }
        None
    }

    /// `castTo`: tests every live ray in the beam (already expressed in
    /// `frame`'s local coordinates) against this boundary's shape, marking
    /// hits without invoking the EM interface.
    pub fn cast_to(&self, beam: &mut RayBeam) {
        for i in 0..beam.capacity() {
            if !beam.has_ray(i) {
                continue;
            }
            if let Some(hit) = self.intercept(beam.origin(i), beam.direction(i)) {
                beam.mark_intercepted(i, hit.point, hit.normal, hit.t);
            }
        }
    }

    /// The full per-stage algorithm from spec.md §4.4: convert into the
    /// boundary's frame, intercept, transmit, convert back out.
    pub fn transfer(&self, beam: &mut RayBeam, frame: FrameId, arena: &FrameArena) {
        beam.to_relative(frame, arena);
        self.cast_to(beam);
        if let Some(interface) = &self.interface {
            interface.transmit(beam);
        }
        beam.from_relative(frame, arena);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::beam::Ray;
    use crate::core::math::Complex;
    use crate::em::Reflective;
    use crate::shapes::CircularFlat;

    #[test]
    fn test_transfer_flat_mirror_reflects_and_round_trips_frame() {
        let mut arena = FrameArena::new();
        let mirror_frame = arena.add_translated(FrameId::WORLD, Vec3::new(0.0, 0.0, -1.0));
        arena.recalculate(FrameId::WORLD);

        let boundary = MediumBoundary::new(
            "m1",
            Box::new(CircularFlat::new(1.0, 0.0, false)),
            Some(Box::new(Reflective)),
            false,
        );

        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 0.0),
            direction: Vec3::new(0.0, 0.0, -1.0),
            length: 0.0,
            cum_opt_length: 0.0,
            ref_ndx: 1.0,
            wavelength: 0.55,
            amplitude: Complex::one(),
            id: 0,
            intercepted: false,
            chief: false,
        };
        let mut beam = RayBeam::new(&[ray], 1, false);
        boundary.transfer(&mut beam, mirror_frame, &arena);

        assert!(beam.intercepted(0));
        assert!(beam.direction(0).approx_eq(&Vec3::new(0.0, 0.0, 1.0), 1e-9));
        assert!(beam.destination(0).approx_eq(&Vec3::new(0.0, 0.0, -1.0), 1e-9));
        assert_eq!(beam.relative_to(), crate::beam::RelativeTo::World);
    }
}
