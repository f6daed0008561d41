/// Mathematical primitives used throughout the raytracer: 3-vectors, 3x3
/// matrices and a minimal complex scalar for amplitude bookkeeping.
pub(crate) mod array;
pub(crate) mod complex;
pub(crate) mod constants;
pub(crate) mod mat3;
pub(crate) mod vec3;

pub(crate) use complex::Complex;
pub(crate) use mat3::Mat3;
pub(crate) use vec3::Vec3;
