//! The process-wide element factory registry: populated once during
//! library initialisation, read-only afterwards (spec.md §9).

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use anyhow::{anyhow, Result};

use super::OpticalElement;
use crate::core::Float;
use crate::frame::{FrameArena, FrameId};

/// A named element constructor: given the frame it should attach to and its
/// evaluated numeric parameters, builds a boxed [`OpticalElement`].
pub type ElementFactoryFn =
    Arc<dyn Fn(FrameId, &mut FrameArena, &HashMap<String, Float>) -> Result<Box<dyn OpticalElement>> + Send + Sync>;

/// A registered element factory: its constructor plus the parameter names
/// it accepts (for diagnostics).
#[derive(Clone)]
pub struct ElementFactory {
    pub build: ElementFactoryFn,
}

fn registry() -> &'static RwLock<HashMap<String, ElementFactory>> {
    static REGISTRY: OnceLock<RwLock<HashMap<String, ElementFactory>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(super::builtin::register_builtins()))
}

/// Registers (or replaces) a named element factory.
pub fn register(name: impl Into<String>, factory: ElementFactory) {
    registry()
        .write()
        .expect("element factory registry poisoned")
        .insert(name.into(), factory);
}

/// Instantiates `factory_name` on `parent`, or an error if no such factory
/// is registered (spec.md §4.6's "unresolved factory" failure mode).
pub fn build(
    factory_name: &str,
    parent: FrameId,
    frames: &mut FrameArena,
    params: &HashMap<String, Float>,
) -> Result<Box<dyn OpticalElement>> {
    let factory = registry()
        .read()
        .expect("element factory registry poisoned")
        .get(factory_name)
        .cloned()
        .ok_or_else(|| anyhow!("unresolved element factory: {factory_name}"))?;
    (factory.build)(parent, frames, params)
}

pub fn is_registered(factory_name: &str) -> bool {
    registry()
        .read()
        .expect("element factory registry poisoned")
        .contains_key(factory_name)
}
