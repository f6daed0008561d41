use super::EMInterface;
use crate::beam::RayBeam;

/// The identity interface: rays pass through completely unaffected
/// (spec.md §4.3).
#[derive(Debug, Clone, Copy, Default)]
pub struct Dummy;

impl EMInterface for Dummy {
    fn transmit(&self, _beam: &mut RayBeam) {}
}
