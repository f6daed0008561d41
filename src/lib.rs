//! An opto-mechanical ray-tracing core: a reference-frame graph, a
//! parameterised element model assembled from a textual recipe, and a
//! sequential/non-sequential tracing engine built on top of them.
//!
//! The four layers, bottom to top:
//!
//! - [`frame`] — a tree of 3D affine reference frames with lazy,
//!   invalidate-on-write propagation ([`frame::FrameArena`]).
//! - [`shapes`] and [`em`] — surface geometry ([`shapes::SurfaceShape`]) and
//!   the electromagnetic interfaces that act on a beam at a surface
//!   ([`em::EMInterface`]), coupled together by [`boundary::MediumBoundary`].
//! - [`beam`] — the structure-of-arrays ray beam ([`beam::RayBeam`]) the
//!   engine and EM interfaces operate on.
//! - [`element`] — named, parameterised opto-mechanical parts
//!   ([`element::OpticalElement`]) that own child frames and optical
//!   surfaces, built through a process-wide factory registry
//!   ([`element::registry`]).
//!
//! [`recipe`] parses the textual description of a system into an AST,
//! [`model`] instantiates that AST into a frame tree and element set, and
//! [`engine`] traces beams of rays through the result.

pub mod beam;
pub mod boundary;
pub(crate) mod core;
pub mod detector;
pub mod element;
pub mod em;
pub mod engine;
pub mod frame;
pub mod model;
pub mod recipe;
pub mod shapes;
pub mod zernike;

pub use beam::{Ray, RayBeam, RelativeTo};
pub use boundary::{BoundaryId, MediumBoundary};
pub use core::math::{Complex, Mat3, Vec3};
pub use detector::{Cell, DetectorStorage, FrameExport};
pub use element::{OpticalElement, OpticalSurface};
pub use em::EMInterface;
pub use engine::{AllSurfacesHeuristic, NonSequentialTracer, SequentialTracer, TraceProgress, VisibilityHeuristic};
pub use frame::{FrameArena, FrameId};
pub use model::{CompositeModel, OpticalPath};
pub use recipe::{parse, Recipe};
pub use shapes::{Intercept, Sample, SurfaceShape};
pub use zernike::{StandardZernikeBasis, ZernikeBasis};
