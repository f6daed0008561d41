//! The ray-tracing engine: sequential and non-sequential traversal of a
//! beam through an ordered or heuristically-chosen set of surfaces
//! (spec.md §4.5).

pub mod heuristic;
mod listener;
mod non_sequential;
mod sequential;

pub use heuristic::{AllSurfacesHeuristic, VisibilityHeuristic};
pub use listener::{TraceListener, TraceProgress};
pub use non_sequential::NonSequentialTracer;
pub use sequential::SequentialTracer;
