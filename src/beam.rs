//! The ray beam: a structure-of-arrays representation of a large batch of
//! rays, with per-ray mask bits, shared by the sequential and
//! non-sequential tracing engines.

use ndarray::Array2;

use crate::boundary::BoundaryId;
use crate::core::math::{Complex, Vec3};
use crate::core::Float;
use crate::frame::{FrameArena, FrameId};

const HAS_RAY: u8 = 0b001;
const INTERCEPTED: u8 = 0b010;
const IS_CHIEF: u8 = 0b100;

/// Which coordinate system the beam's point/vector columns are currently
/// expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeTo {
    World,
    Frame(FrameId),
}

/// A structure-of-arrays batch of up to `capacity` rays. Pruning a ray
/// clears its `has-ray` bit; the beam is never resized during a trace.
#[derive(Debug, Clone)]
pub struct RayBeam {
    origins: Array2<Float>,
    destinations: Array2<Float>,
    directions: Array2<Float>,
    normals: Array2<Float>,
    lengths: Vec<Float>,
    cum_opt_lengths: Vec<Float>,
    amplitude: Vec<Complex>,
    wavelengths: Vec<Float>,
    ref_ndx: Vec<Float>,
    ids: Vec<u32>,
    surfaces: Vec<Option<BoundaryId>>,
    mask: Vec<u8>,
    non_seq: bool,
    relative_to: RelativeTo,
}

/// The scalar form of a single ray, used at I/O boundaries (beam
/// construction, `extractRays`).
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub length: Float,
    pub cum_opt_length: Float,
    pub ref_ndx: Float,
    pub wavelength: Float,
    pub amplitude: Complex,
    pub id: u32,
    pub intercepted: bool,
    pub chief: bool,
}

impl RayBeam {
    /// Builds a beam from a list of input rays, padded to `capacity` with
    /// pruned (has-ray = false) rows if `rays.len() < capacity`.
    pub fn new(rays: &[Ray], capacity: usize, non_seq: bool) -> Self {
        assert!(
            rays.len() <= capacity,
            "beam capacity must be at least the number of input rays"
        );
        let mut beam = Self {
            origins: Array2::zeros((capacity, 3)),
            destinations: Array2::zeros((capacity, 3)),
            directions: Array2::zeros((capacity, 3)),
            normals: Array2::zeros((capacity, 3)),
            lengths: vec![0.0; capacity],
            cum_opt_lengths: vec![0.0; capacity],
            amplitude: vec![Complex::zero(); capacity],
            wavelengths: vec![0.0; capacity],
            ref_ndx: vec![1.0; capacity],
            ids: vec![0; capacity],
            surfaces: vec![None; capacity],
            mask: vec![0u8; capacity],
            non_seq,
            relative_to: RelativeTo::World,
        };
        for (i, ray) in rays.iter().enumerate() {
            beam.set_origin(i, ray.origin);
            beam.set_direction(i, ray.direction.normalize());
            beam.lengths[i] = ray.length;
            beam.cum_opt_lengths[i] = ray.cum_opt_length;
            beam.amplitude[i] = ray.amplitude;
            beam.wavelengths[i] = ray.wavelength;
            beam.ref_ndx[i] = ray.ref_ndx;
            beam.ids[i] = ray.id;
            beam.mask[i] |= HAS_RAY;
            if ray.intercepted {
                beam.mask[i] |= INTERCEPTED;
            }
            if ray.chief {
                beam.mask[i] |= IS_CHIEF;
            }
        }
        beam
    }

    pub fn capacity(&self) -> usize {
        self.mask.len()
    }

    pub fn non_seq(&self) -> bool {
        self.non_seq
    }

    pub fn relative_to(&self) -> RelativeTo {
        self.relative_to
    }

    pub fn has_ray(&self, i: usize) -> bool {
        self.mask[i] & HAS_RAY != 0
    }

    pub fn intercepted(&self, i: usize) -> bool {
        self.mask[i] & INTERCEPTED != 0
    }

    pub fn is_chief(&self, i: usize) -> bool {
        self.mask[i] & IS_CHIEF != 0
    }

    pub fn set_chief(&mut self, i: usize, chief: bool) {
        if chief {
            self.mask[i] |= IS_CHIEF;
        } else {
            self.mask[i] &= !IS_CHIEF;
        }
    }

    /// Directly sets ray `i`'s intercepted bit, used by the non-sequential
    /// tracer to isolate one surface's rows before calling its interface's
    /// `transmit` (spec.md §4.5).
    pub fn set_intercepted(&mut self, i: usize, intercepted: bool) {
        if intercepted {
            self.mask[i] |= INTERCEPTED;
        } else {
            self.mask[i] &= !INTERCEPTED;
        }
    }

    /// Clears a ray's has-ray bit without moving any data (spec.md §9).
    pub fn prune(&mut self, i: usize) {
        self.mask[i] &= !HAS_RAY;
    }

    /// Clears the intercepted bit on every row, in preparation for the next
    /// stage's `castTo`.
    pub fn clear_intercepted(&mut self) {
        for m in self.mask.iter_mut() {
            *m &= !INTERCEPTED;
        }
    }

    fn row(array: &Array2<Float>, i: usize) -> Vec3 {
        Vec3::new(array[[i, 0]], array[[i, 1]], array[[i, 2]])
    }

    fn set_row(array: &mut Array2<Float>, i: usize, v: Vec3) {
        let [x, y, z] = v.to_array();
        array[[i, 0]] = x;
        array[[i, 1]] = y;
        array[[i, 2]] = z;
    }

    pub fn origin(&self, i: usize) -> Vec3 {
        Self::row(&self.origins, i)
    }

    pub fn set_origin(&mut self, i: usize, v: Vec3) {
        Self::set_row(&mut self.origins, i, v);
    }

    pub fn destination(&self, i: usize) -> Vec3 {
        Self::row(&self.destinations, i)
    }

    pub fn set_destination(&mut self, i: usize, v: Vec3) {
        Self::set_row(&mut self.destinations, i, v);
    }

    pub fn direction(&self, i: usize) -> Vec3 {
        Self::row(&self.directions, i)
    }

    pub fn set_direction(&mut self, i: usize, v: Vec3) {
        Self::set_row(&mut self.directions, i, v);
    }

    pub fn normal(&self, i: usize) -> Vec3 {
        Self::row(&self.normals, i)
    }

    pub fn set_normal(&mut self, i: usize, v: Vec3) {
        Self::set_row(&mut self.normals, i, v);
    }

    pub fn length(&self, i: usize) -> Float {
        self.lengths[i]
    }

    pub fn add_length(&mut self, i: usize, dl: Float) {
        self.lengths[i] += dl;
    }

    pub fn cum_opt_length(&self, i: usize) -> Float {
        self.cum_opt_lengths[i]
    }

    pub fn add_cum_opt_length(&mut self, i: usize, d_opl: Float) {
        self.cum_opt_lengths[i] += d_opl;
    }

    pub fn amplitude(&self, i: usize) -> Complex {
        self.amplitude[i]
    }

    pub fn set_amplitude(&mut self, i: usize, a: Complex) {
        self.amplitude[i] = a;
    }

    pub fn wavelength(&self, i: usize) -> Float {
        self.wavelengths[i]
    }

    pub fn ref_ndx(&self, i: usize) -> Float {
        self.ref_ndx[i]
    }

    pub fn set_ref_ndx(&mut self, i: usize, n: Float) {
        self.ref_ndx[i] = n;
    }

    pub fn id(&self, i: usize) -> u32 {
        self.ids[i]
    }

    pub fn surface(&self, i: usize) -> Option<BoundaryId> {
        self.surfaces[i]
    }

    pub fn set_surface(&mut self, i: usize, s: Option<BoundaryId>) {
        self.surfaces[i] = s;
    }

    /// Marks ray `i` as having intercepted the current surface and updates
    /// its destination/normal/length/cumulative optical path, per the
    /// `MediumBoundary::transfer` algorithm in spec.md §4.4.
    pub fn mark_intercepted(&mut self, i: usize, destination: Vec3, normal: Vec3, t: Float) {
        self.set_destination(i, destination);
        self.set_normal(i, normal);
        self.add_length(i, t);
        let n = self.ref_ndx(i);
        self.add_cum_opt_length(i, n * t);
        self.mask[i] |= INTERCEPTED;
    }

    /// `origins <- destinations`, run between stages of a sequential trace.
    pub fn update_origins(&mut self) {
        self.origins.assign(&self.destinations);
    }

    fn point_to_world(p: Vec3, rel: RelativeTo, arena: &FrameArena) -> Vec3 {
        match rel {
            RelativeTo::World => p,
            RelativeTo::Frame(f) => arena.orientation(f) * p + arena.center(f),
        }
    }

    fn point_from_world(p: Vec3, rel: RelativeTo, arena: &FrameArena) -> Vec3 {
        match rel {
            RelativeTo::World => p,
            RelativeTo::Frame(f) => arena.orientation(f).transpose() * (p - arena.center(f)),
        }
    }

    fn vec_to_world(v: Vec3, rel: RelativeTo, arena: &FrameArena) -> Vec3 {
        match rel {
            RelativeTo::World => v,
            RelativeTo::Frame(f) => arena.orientation(f) * v,
        }
    }

    fn vec_from_world(v: Vec3, rel: RelativeTo, arena: &FrameArena) -> Vec3 {
        match rel {
            RelativeTo::World => v,
            RelativeTo::Frame(f) => arena.orientation(f).transpose() * v,
        }
    }

    /// Converts every live row from the beam's current frame into `target`,
    /// a no-op if already expressed relative to `target`.
    fn convert(&mut self, target: RelativeTo, arena: &FrameArena) {
        if self.relative_to == target {
            return;
        }
        for i in 0..self.capacity() {
            if !self.has_ray(i) {
                continue;
            }
            let origin_world = Self::point_to_world(self.origin(i), self.relative_to, arena);
            let dest_world = Self::point_to_world(self.destination(i), self.relative_to, arena);
            let dir_world = Self::vec_to_world(self.direction(i), self.relative_to, arena);
            let normal_world = Self::vec_to_world(self.normal(i), self.relative_to, arena);

            self.set_origin(i, Self::point_from_world(origin_world, target, arena));
            self.set_destination(i, Self::point_from_world(dest_world, target, arena));
            self.set_direction(i, Self::vec_from_world(dir_world, target, arena));
            self.set_normal(i, Self::vec_from_world(normal_world, target, arena));
        }
        self.relative_to = target;
    }

    /// Converts the beam into `frame`'s local coordinates. Idempotent: a
    /// second call with the same frame is a no-op (spec.md §3).
    pub fn to_relative(&mut self, frame: FrameId, arena: &FrameArena) {
        self.convert(RelativeTo::Frame(frame), arena);
    }

    /// Converts the beam out of `frame`'s local coordinates back into world
    /// coordinates.
    pub fn from_relative(&mut self, frame: FrameId, arena: &FrameArena) {
        debug_assert!(
            self.relative_to == RelativeTo::Frame(frame) || self.relative_to == RelativeTo::World,
            "fromRelative called against a frame the beam isn't expressed in"
        );
        self.convert(RelativeTo::World, arena);
    }

    /// Extracts beam rows into `Ray` records.
    ///
    /// `origin_pov` selects whether `origin` or `destination` feeds the
    /// resulting `Ray::origin`; `intercepted_only`/`vignetted_only` filter
    /// which rows are copied (both `false` copies every live row).
    pub fn extract_rays(&self, origin_pov: bool, intercepted_only: bool, vignetted_only: bool) -> Vec<Ray> {
        let mut out = Vec::new();
        for i in 0..self.capacity() {
            if !self.has_ray(i) {
                continue;
            }
            let intercepted = self.intercepted(i);
            if intercepted_only && !intercepted {
                continue;
            }
            if vignetted_only && intercepted {
                continue;
            }
            out.push(Ray {
                origin: if origin_pov {
                    self.origin(i)
                } else {
                    self.destination(i)
                },
                direction: self.direction(i),
                length: self.length(i),
                cum_opt_length: self.cum_opt_length(i),
                ref_ndx: self.ref_ndx(i),
                wavelength: self.wavelength(i),
                amplitude: self.amplitude(i),
                id: self.id(i),
                intercepted,
                chief: self.is_chief(i),
            });
        }
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn straight_down_ray() -> Ray {
        Ray {
            origin: Vec3::new(0.0, 0.0, 1.0),
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
    fn test_prune_clears_has_ray_without_moving_data() {
        let mut beam = RayBeam::new(&[straight_down_ray()], 1, false);
        let origin = beam.origin(0);
        beam.prune(0);
        assert!(!beam.has_ray(0));
        assert_eq!(beam.origin(0), origin);
    }

    #[test]
    fn test_round_trip_to_relative_is_idempotent() {
        let mut arena = FrameArena::new();
        let f = arena.add_translated(FrameId::WORLD, Vec3::new(1.0, 2.0, 3.0));
        arena.recalculate(FrameId::WORLD);

        let mut beam = RayBeam::new(&[straight_down_ray()], 1, false);
        let original = beam.origin(0);

        beam.to_relative(f, &arena);
        beam.from_relative(f, &arena);

        assert!(beam.origin(0).approx_eq(&original, 1e-9));
    }

    #[test]
    fn test_capacity_never_shrinks_on_prune() {
        let rays = [straight_down_ray(), straight_down_ray()];
        let mut beam = RayBeam::new(&rays, 2, false);
        beam.prune(0);
        assert_eq!(beam.capacity(), 2);
    }
}
