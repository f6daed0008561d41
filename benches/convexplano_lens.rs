use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use opticsim_core::em::Paraxial;
use opticsim_core::shapes::Conic;
use opticsim_core::{
    Complex, FrameArena, FrameId, MediumBoundary, NonSequentialTracer, OpticalSurface, Ray,
    RayBeam, Vec3,
};

const FOCAL_LENGTH: f64 = 0.2;
const APERTURE_RADIUS: f64 = 0.025;
const RAY_COUNT: usize = 4096;

fn collimated_beam() -> Vec<Ray> {
    (0..RAY_COUNT)
        .map(|i| {
            let theta = 2.0 * std::f64::consts::PI * (i as f64) / (RAY_COUNT as f64);
            let r = APERTURE_RADIUS * 0.9;
            Ray {
                origin: Vec3::new(r * theta.cos(), r * theta.sin(), 1.0),
                direction: Vec3::new(0.0, 0.0, -1.0),
                length: 0.0,
                cum_opt_length: 0.0,
                ref_ndx: 1.0,
                wavelength: 0.5876,
                amplitude: Complex::one(),
                id: i as u32,
                intercepted: false,
                chief: i == 0,
            }
        })
        .collect()
}

fn benchmark(c: &mut Criterion) {
    c.bench_function("non-sequential trace, convexplano lens", |b| {
        let mut arena = FrameArena::new();
        let lens_frame = arena.add_translated(FrameId::WORLD, Vec3::zero());
        arena.recalculate(FrameId::WORLD);

        let shape = Conic::new(2.0 * FOCAL_LENGTH, -1.0, APERTURE_RADIUS, 0.0, (0.0, 0.0), true, false);
        let boundary = MediumBoundary::new("lens", Box::new(shape), Some(Box::new(Paraxial::new(FOCAL_LENGTH))), false);
        let mut lens_surface = OpticalSurface::new("lens", lens_frame, boundary, false);

        let rays = collimated_beam();
        let heuristic = opticsim_core::AllSurfacesHeuristic;

        b.iter(|| {
            let mut beam = RayBeam::new(&rays, rays.len(), true);
            NonSequentialTracer::trace(
                black_box(&mut [&mut lens_surface]),
                black_box(&heuristic),
                black_box(1),
                black_box(&mut beam),
                black_box(&arena),
                None,
            )
        })
    });
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
