//! Sequential ray tracing: a fixed, ordered path of surfaces every ray
//! visits in turn (spec.md §4.5).

use tracing::debug;

use crate::beam::RayBeam;
use crate::core::CANCEL_POLL_INTERVAL;
use crate::element::OpticalSurface;
use crate::frame::FrameArena;

use super::{TraceListener, TraceProgress};

/// Traces `beam` sequentially through `path`, in order. Each stage's
/// `MediumBoundary::transfer` casts the beam into the surface's frame,
/// intersects it, runs the EM interface, and converts back to world
/// coordinates (spec.md §4.4). A ray that fails to hit a stage's surface is
/// vignetted: pruned on the spot, it never reaches later stages.
pub struct SequentialTracer;

impl SequentialTracer {
    pub fn trace(
        path: &mut [&mut OpticalSurface],
        beam: &mut RayBeam,
        arena: &FrameArena,
        listener: Option<&dyn TraceListener>,
    ) -> TraceProgress {
        let mut progress = TraceProgress::default();
        let total_stages = path.len();

        for (stage_index, surface) in path.iter_mut().enumerate() {
            if let Some(l) = listener {
                if !l.on_stage(surface.name(), stage_index, total_stages) {
                    progress.cancelled = true;
                    return progress;
                }
            }

            debug!(stage = surface.name(), index = stage_index, "castTo/transmitThrough");
            beam.clear_intercepted();
            surface.boundary().transfer(beam, surface.frame(), arena);

            let capacity = beam.capacity();
            for i in 0..capacity {
                if !beam.has_ray(i) {
                    continue;
                }
                if beam.intercepted(i) {
                    progress.intercepted += 1;
                    if surface.record_hits_enabled() {
                        surface.record_hit(beam.destination(i), beam.amplitude(i), beam.id(i));
                    }
                } else {
                    progress.vignetted += 1;
                    beam.prune(i);
                }

                if let Some(l) = listener {
                    if i % CANCEL_POLL_INTERVAL == 0 && !l.on_progress(surface.name(), i, capacity) {
                        progress.cancelled = true;
                        return progress;
                    }
                }
            }

            beam.update_origins();
        }

        progress
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::beam::Ray;
    use crate::boundary::MediumBoundary;
    use crate::core::math::{Complex, Vec3};
    use crate::em::Dummy;
    use crate::frame::FrameId;
    use crate::shapes::RectangularFlat;

    fn straight_down_ray(x: f64) -> Ray {
        Ray {
            origin: Vec3::new(x, 0.0, 1.0),
            direction: Vec3::new(0.0, 0.0, -1.0),
            length: 0.0,
            cum_opt_length: 0.0,
            ref_ndx: 1.0,
            wavelength: 0.55,
            amplitude: Complex::one(),
            id: 0,
            intercepted: false,
            chief: false,
        }
    }

    #[test]
    fn test_flat_detector_stops_every_ray_at_its_plane() {
        let mut arena = FrameArena::new();
        let detector_frame = arena.add_translated(FrameId::WORLD, Vec3::new(0.0, 0.0, -1.0));
        arena.recalculate(FrameId::WORLD);

        let boundary = MediumBoundary::new(
            "detector",
            Box::new(RectangularFlat::new(10.0, 10.0, false)),
            Some(Box::new(Dummy)),
            false,
        );
        let mut surface = OpticalSurface::new("detector", detector_frame, boundary, false);

        let rays = [straight_down_ray(0.0), straight_down_ray(0.1)];
        let mut beam = RayBeam::new(&rays, 2, false);

        let progress = SequentialTracer::trace(&mut [&mut surface], &mut beam, &arena, None);

        assert_eq!(progress.intercepted, 2);
        assert_eq!(progress.vignetted, 0);
        assert!((beam.destination(0).z() - (-1.0)).abs() < 1e-9);
        assert!((beam.length(0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_miss_vignettes_and_prunes_the_ray() {
        let mut arena = FrameArena::new();
        let detector_frame = arena.add_translated(FrameId::WORLD, Vec3::new(0.0, 0.0, -1.0));
        arena.recalculate(FrameId::WORLD);

        let boundary = MediumBoundary::new(
            "detector",
            Box::new(RectangularFlat::new(0.05, 0.05, false)),
            Some(Box::new(Dummy)),
            false,
        );
        let mut surface = OpticalSurface::new("detector", detector_frame, boundary, false);

        let rays = [straight_down_ray(5.0)];
        let mut beam = RayBeam::new(&rays, 1, false);

        let progress = SequentialTracer::trace(&mut [&mut surface], &mut beam, &arena, None);

        assert_eq!(progress.intercepted, 0);
        assert_eq!(progress.vignetted, 1);
        assert!(!beam.has_ray(0));
    }
}
