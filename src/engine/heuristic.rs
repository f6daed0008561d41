//! The non-sequential tracer's pluggable "which surfaces can this beam see"
//! decision (spec.md §4.5, §9: "the source contains a dummy heuristic only").

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use crate::beam::RayBeam;

/// Decides which of `surface_count` candidate surfaces a beam should be
/// tested against this propagation round. Surfaces are referred to by their
/// position in the caller's surface list.
pub trait VisibilityHeuristic: std::fmt::Debug + Send + Sync {
    fn visible_surfaces(&self, beam: &RayBeam, surface_count: usize) -> Vec<usize>;
}

/// Every surface is always visible to every ray. The only heuristic named
/// in the source material (spec.md §9).
#[derive(Debug, Default)]
pub struct AllSurfacesHeuristic;

impl VisibilityHeuristic for AllSurfacesHeuristic {
    fn visible_surfaces(&self, _beam: &RayBeam, surface_count: usize) -> Vec<usize> {
        (0..surface_count).collect()
    }
}

fn registry() -> &'static RwLock<HashMap<String, Arc<dyn VisibilityHeuristic>>> {
    static REGISTRY: OnceLock<RwLock<HashMap<String, Arc<dyn VisibilityHeuristic>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut map: HashMap<String, Arc<dyn VisibilityHeuristic>> = HashMap::new();
        map.insert("dummy".to_string(), Arc::new(AllSurfacesHeuristic));
        RwLock::new(map)
    })
}

/// Registers (or replaces) a named heuristic.
pub fn register(name: impl Into<String>, heuristic: Arc<dyn VisibilityHeuristic>) {
    registry()
        .write()
        .expect("heuristic registry poisoned")
        .insert(name.into(), heuristic);
}

/// Looks up a registered heuristic by name.
pub fn get(name: &str) -> Option<Arc<dyn VisibilityHeuristic>> {
    registry().read().expect("heuristic registry poisoned").get(name).cloned()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_dummy_heuristic_is_registered() {
        assert!(get("dummy").is_some());
    }

    #[test]
    fn test_all_surfaces_heuristic_returns_every_index() {
        let h = AllSurfacesHeuristic;
        let beam = RayBeam::new(&[], 0, true);
        assert_eq!(h.visible_surfaces(&beam, 3), vec![0, 1, 2]);
    }
}
