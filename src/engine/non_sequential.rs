//! Non-sequential ray tracing: each propagation round, every ray chooses
//! its own next surface from whichever candidates a [`VisibilityHeuristic`]
//! reports (spec.md §4.5).

use rayon::prelude::*;
use tracing::debug;

use crate::beam::RayBeam;
use crate::boundary::BoundaryId;
use crate::core::math::Vec3;
use crate::core::PARALLEL_THRESHOLD;
use crate::element::OpticalSurface;
use crate::frame::FrameArena;

use super::heuristic::VisibilityHeuristic;
use super::{TraceListener, TraceProgress};

/// Traces `beam` non-sequentially against `surfaces` for up to
/// `max_propagations` rounds, stopping early once no ray advances. Surfaces
/// are addressed by their position in `surfaces` for the duration of this
/// call; `BoundaryId(index)` has no meaning beyond it.
pub struct NonSequentialTracer;

impl NonSequentialTracer {
    pub fn trace(
        surfaces: &mut [&mut OpticalSurface],
        heuristic: &dyn VisibilityHeuristic,
        max_propagations: usize,
        beam: &mut RayBeam,
        arena: &FrameArena,
        listener: Option<&dyn TraceListener>,
    ) -> TraceProgress {
        let mut progress = TraceProgress::default();
        let capacity = beam.capacity();

        for round in 0..max_propagations {
            if let Some(l) = listener {
                if !l.on_stage("non-sequential round", round, max_propagations) {
                    progress.cancelled = true;
                    return progress;
                }
            }

            let visible = heuristic.visible_surfaces(beam, surfaces.len());
            beam.clear_intercepted();

            let mut best_t: Vec<Option<f64>> = vec![None; capacity];
            let mut best_destination: Vec<Vec3> = vec![Vec3::zero(); capacity];
            let mut best_normal: Vec<Vec3> = vec![Vec3::zero(); capacity];
            let mut best_surface: Vec<Option<BoundaryId>> = vec![None; capacity];

            for &surface_index in &visible {
                let surface = &surfaces[surface_index];
                let mut tmp = beam.clone();
                tmp.to_relative(surface.frame(), arena);
                surface.boundary().cast_to(&mut tmp);
                tmp.from_relative(surface.frame(), arena);

                let candidate_hit = |i: usize| -> Option<(f64, Vec3, Vec3)> {
                    if !tmp.has_ray(i) || !tmp.intercepted(i) {
                        return None;
                    }
                    let t = tmp.length(i) - beam.length(i);
                    if t <= 0.0 {
                        return None;
                    }
                    Some((t, tmp.destination(i), tmp.normal(i)))
                };

                let hits: Vec<Option<(f64, Vec3, Vec3)>> = if capacity >= PARALLEL_THRESHOLD {
                    (0..capacity).into_par_iter().map(candidate_hit).collect()
                } else {
                    (0..capacity).map(candidate_hit).collect()
                };

                for (i, hit) in hits.into_iter().enumerate() {
                    let Some((t, destination, normal)) = hit else {
                        continue;
                    };
                    if best_t[i].is_none_or(|current| t < current) {
                        best_t[i] = Some(t);
                        best_destination[i] = destination;
                        best_normal[i] = normal;
                        best_surface[i] = Some(BoundaryId(surface_index));
                    }
                }
            }

            let mut advanced = false;
            for i in 0..capacity {
                if let Some(t) = best_t[i] {
                    advanced = true;
                    beam.mark_intercepted(i, best_destination[i], best_normal[i], t);
                    beam.set_surface(i, best_surface[i]);
                }
            }

            if !advanced {
                break;
            }

            for &surface_index in &visible {
                let tags: Vec<bool> = (0..capacity)
                    .map(|i| beam.surface(i) == Some(BoundaryId(surface_index)))
                    .collect();
                if !tags.iter().any(|&t| t) {
                    continue;
                }
                let saved: Vec<bool> = (0..capacity).map(|i| beam.intercepted(i)).collect();
                for i in 0..capacity {
                    if saved[i] && !tags[i] {
                        beam.set_intercepted(i, false);
                    }
                }

                let surface = &surfaces[surface_index];
                debug!(stage = surface.name(), round, "non-sequential transmitThrough");
                beam.to_relative(surface.frame(), arena);
                if let Some(interface) = surface.boundary().interface() {
                    interface.transmit(beam);
                }
                beam.from_relative(surface.frame(), arena);

                for i in 0..capacity {
                    if saved[i] && !tags[i] {
                        beam.set_intercepted(i, true);
                    }
                }
            }

            beam.update_origins();
        }

        for i in 0..capacity {
            if !beam.has_ray(i) {
                continue;
            }
            if beam.intercepted(i) {
                progress.intercepted += 1;
            } else {
                progress.vignetted += 1;
            }
        }

        progress
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::beam::Ray;
    use crate::boundary::MediumBoundary;
    use crate::core::math::Complex;
    use crate::em::Reflective;
    use crate::engine::heuristic::AllSurfacesHeuristic;
    use crate::frame::FrameId;
    use crate::shapes::CircularFlat;

    fn straight_ray(z: f64, dz: f64) -> Ray {
        Ray {
            origin: Vec3::new(0.0, 0.0, z),
            direction: Vec3::new(0.0, 0.0, dz),
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
    fn test_two_facing_mirrors_bounce_rays_without_vignetting() {
        let mut arena = FrameArena::new();
        let top = arena.add_translated(FrameId::WORLD, Vec3::new(0.0, 0.0, 1.0));
        let bottom = arena.add_translated(FrameId::WORLD, Vec3::new(0.0, 0.0, -1.0));
        arena.recalculate(FrameId::WORLD);

        let mut top_surface = OpticalSurface::new(
            "top",
            top,
            MediumBoundary::new(
                "top",
                Box::new(CircularFlat::new(1.0, 0.0, false)),
                Some(Box::new(Reflective)),
                false,
            ),
            false,
        );
        let mut bottom_surface = OpticalSurface::new(
            "bottom",
            bottom,
            MediumBoundary::new(
                "bottom",
                Box::new(CircularFlat::new(1.0, 0.0, false)),
                Some(Box::new(Reflective)),
                false,
            ),
            false,
        );

        let rays: Vec<Ray> = (0..4).map(|_| straight_ray(0.0, 1.0)).collect();
        let mut beam = RayBeam::new(&rays, rays.len(), true);

        let progress = NonSequentialTracer::trace(
            &mut [&mut top_surface, &mut bottom_surface],
            &AllSurfacesHeuristic,
            2,
            &mut beam,
            &arena,
            None,
        );

        assert_eq!(progress.vignetted, 0);
        assert_eq!(progress.intercepted, 4);
    }
}
