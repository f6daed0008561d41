//! The reference-frame graph: a tree of affine transforms with lazy,
//! whole-subtree recomputation.
//!
//! Frames are stored in a [`FrameArena`] and addressed by [`FrameId`] rather
//! than linked through `Rc<RefCell<_>>` parent/child pointers, so that
//! optical surfaces and recipe contexts can hold a plain, `Copy` handle into
//! a single owning container instead of a shared reference.

use crate::core::math::{Mat3, Vec3};
use crate::core::{Float, GEOM_ZERO_TOL};

mod tripod;

/// A stable handle into a [`FrameArena`]. `FrameId(0)` is always the world
/// frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub(crate) usize);

impl FrameId {
    pub const WORLD: FrameId = FrameId(0);
}

/// The variant-specific construction parameters of a frame, as described in
/// spec.md's Data Model section.
#[derive(Debug, Clone)]
pub enum FrameVariant {
    World,
    Translated { parent: FrameId, d: Vec3 },
    Rotated { parent: FrameId, axis: Vec3, angle: Float },
    Tripod {
        parent: FrameId,
        radius: Float,
        angle: Float,
        legs: [Float; 3],
    },
}

impl FrameVariant {
    fn parent(&self) -> Option<FrameId> {
        match self {
            FrameVariant::World => None,
            FrameVariant::Translated { parent, .. }
            | FrameVariant::Rotated { parent, .. }
            | FrameVariant::Tripod { parent, .. } => Some(*parent),
        }
    }
}

#[derive(Debug, Clone)]
struct FrameNode {
    variant: FrameVariant,
    center: Vec3,
    orientation: Mat3,
    axes: Vec<(String, Vec3)>,
    axes_abs: Vec<(String, Vec3)>,
    points: Vec<(String, Vec3)>,
    points_abs: Vec<(String, Vec3)>,
    children: Vec<FrameId>,
    calculated: bool,
}

impl FrameNode {
    fn new(variant: FrameVariant) -> Self {
        Self {
            variant,
            center: Vec3::zero(),
            orientation: Mat3::identity(),
            axes: Vec::new(),
            axes_abs: Vec::new(),
            points: Vec::new(),
            points_abs: Vec::new(),
            children: Vec::new(),
            calculated: false,
        }
    }
}

/// Owning container for a tree of reference frames.
///
/// Index 0 always holds the [`FrameVariant::World`] root.
#[derive(Debug, Clone)]
pub struct FrameArena {
    nodes: Vec<FrameNode>,
}

impl Default for FrameArena {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameArena {
    pub fn new() -> Self {
        let mut world = FrameNode::new(FrameVariant::World);
        world.calculated = true;
        Self { nodes: vec![world] }
    }

    fn push(&mut self, variant: FrameVariant) -> FrameId {
        let parent = variant
            .parent()
            .expect("only World has no parent, and World is created once in FrameArena::new");
        let id = FrameId(self.nodes.len());
        self.nodes.push(FrameNode::new(variant));
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn add_translated(&mut self, parent: FrameId, d: Vec3) -> FrameId {
        self.push(FrameVariant::Translated { parent, d })
    }

    pub fn add_rotated(&mut self, parent: FrameId, axis: Vec3, angle: Float) -> FrameId {
        self.push(FrameVariant::Rotated {
            parent,
            axis,
            angle,
        })
    }

    pub fn add_tripod(
        &mut self,
        parent: FrameId,
        radius: Float,
        angle: Float,
        legs: [Float; 3],
    ) -> FrameId {
        self.push(FrameVariant::Tripod {
            parent,
            radius,
            angle,
            legs,
        })
    }

    pub fn center(&self, id: FrameId) -> Vec3 {
        self.nodes[id.0].center
    }

    pub fn orientation(&self, id: FrameId) -> Mat3 {
        self.nodes[id.0].orientation
    }

    pub fn is_calculated(&self, id: FrameId) -> bool {
        self.nodes[id.0].calculated
    }

    /// Add (or, if the name already exists on this frame, replace in place) a
    /// named relative axis. Returns a stable index into the frame's axis
    /// list.
    pub fn add_axis(&mut self, id: FrameId, name: &str, relative: Vec3) -> usize {
        let node = &mut self.nodes[id.0];
        if let Some(idx) = node.axes.iter().position(|(n, _)| n == name) {
            node.axes[idx].1 = relative;
            idx
        } else {
            node.axes.push((name.to_string(), relative));
            node.axes_abs.push((name.to_string(), relative));
            node.axes.len() - 1
        }
    }

    /// Add (or replace in place) a named relative point. Returns a stable
    /// index into the frame's point list.
    pub fn add_point(&mut self, id: FrameId, name: &str, relative: Vec3) -> usize {
        let node = &mut self.nodes[id.0];
        if let Some(idx) = node.points.iter().position(|(n, _)| n == name) {
            node.points[idx].1 = relative;
            idx
        } else {
            node.points.push((name.to_string(), relative));
            node.points_abs.push((name.to_string(), relative));
            node.points.len() - 1
        }
    }

    pub fn axis_abs(&self, id: FrameId, name: &str) -> Option<Vec3> {
        self.nodes[id.0]
            .axes_abs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn point_abs(&self, id: FrameId, name: &str) -> Option<Vec3> {
        self.nodes[id.0]
            .points_abs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    /// Invalidate a frame and every frame in its subtree, forcing the next
    /// `recalculate` to recompute them.
    pub fn invalidate(&mut self, id: FrameId) {
        self.nodes[id.0].calculated = false;
        let children = self.nodes[id.0].children.clone();
        for child in children {
            self.invalidate(child);
        }
    }

    /// Set the translation distance of a `Translated` frame. Invalidates the
    /// frame's subtree; callers must follow with `recalculate`.
    pub fn set_distance(&mut self, id: FrameId, d: Vec3) {
        if let FrameVariant::Translated { d: slot, .. } = &mut self.nodes[id.0].variant {
            *slot = d;
        }
        self.invalidate(id);
    }

    /// Set the axis/angle of a `Rotated` frame. Invalidates the frame's
    /// subtree; callers must follow with `recalculate`.
    pub fn set_rotation(&mut self, id: FrameId, axis: Vec3, angle: Float) {
        if let FrameVariant::Rotated {
            axis: a, angle: t, ..
        } = &mut self.nodes[id.0].variant
        {
            *a = axis;
            *t = angle;
        }
        self.invalidate(id);
    }

    /// Set one leg length of a `Tripod` frame. Invalidates the frame's
    /// subtree; callers must follow with `recalculate`.
    pub fn set_leg(&mut self, id: FrameId, leg: usize, length: Float) {
        if let FrameVariant::Tripod { legs, .. } = &mut self.nodes[id.0].variant {
            legs[leg] = length;
        }
        self.invalidate(id);
    }

    /// Recompute `id`'s absolute center/orientation (variant-specific),
    /// transform all of its named axes and points, then recurse into its
    /// children. Idempotent: calling twice in a row yields identical
    /// results (spec.md testable property 1).
    pub fn recalculate(&mut self, id: FrameId) {
        self.recalculate_frame(id);

        let orientation = self.nodes[id.0].orientation;
        let center = self.nodes[id.0].center;
        let node = &mut self.nodes[id.0];
        for (i, (_, relative)) in node.axes.iter().enumerate() {
            node.axes_abs[i].1 = orientation * *relative;
        }
        for (i, (_, relative)) in node.points.iter().enumerate() {
            node.points_abs[i].1 = orientation * *relative + center;
        }
        node.calculated = true;

        let children = self.nodes[id.0].children.clone();
        for child in children {
            self.recalculate(child);
        }
    }

    fn recalculate_frame(&mut self, id: FrameId) {
        let variant = self.nodes[id.0].variant.clone();
        match variant {
            FrameVariant::World => {
                self.nodes[id.0].center = Vec3::zero();
                self.nodes[id.0].orientation = Mat3::identity();
            }
            FrameVariant::Translated { parent, d } => {
                let pc = self.nodes[parent.0].center;
                let po = self.nodes[parent.0].orientation;
                self.nodes[id.0].center = pc + po * d;
                self.nodes[id.0].orientation = po;
            }
            FrameVariant::Rotated { parent, axis, angle } => {
                let pc = self.nodes[parent.0].center;
                let po = self.nodes[parent.0].orientation;
                self.nodes[id.0].center = pc;
                self.nodes[id.0].orientation = po * Mat3::rotation(axis, angle);
            }
            FrameVariant::Tripod {
                parent,
                radius,
                angle,
                legs,
            } => {
                let pc = self.nodes[parent.0].center;
                let po = self.nodes[parent.0].orientation;
                match tripod::solve(radius, angle, legs) {
                    Some((center_local, orientation_local)) => {
                        self.nodes[id.0].center = pc + po * center_local;
                        self.nodes[id.0].orientation = po * orientation_local;
                    }
                    None => {
                        tracing::warn!(
                            frame = id.0,
                            "tripod legs produced a degenerate (colinear) triangle; keeping previous frame"
                        );
                        // Failure semantics (spec.md §4.1): leave the previous matrix.
                    }
                }
            }
        }
    }
}

/// Approximate equality tolerance for geometry comparisons, re-exported for
/// callers composing frame tests.
pub const FRAME_TOL: Float = GEOM_ZERO_TOL;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_world_frame_is_identity() {
        let arena = FrameArena::new();
        assert_eq!(arena.center(FrameId::WORLD), Vec3::zero());
        assert_eq!(arena.orientation(FrameId::WORLD), Mat3::identity());
    }

    #[test]
    fn test_recalculate_is_idempotent() {
        let mut arena = FrameArena::new();
        let f = arena.add_translated(FrameId::WORLD, Vec3::new(1.0, 2.0, 3.0));
        arena.recalculate(FrameId::WORLD);
        let once = arena.center(f);
        arena.recalculate(FrameId::WORLD);
        let twice = arena.center(f);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_translated_composition() {
        let mut arena = FrameArena::new();
        let d = Vec3::new(0.37, 0.0, 0.0);
        let f = arena.add_translated(FrameId::WORLD, d);
        arena.recalculate(FrameId::WORLD);
        assert_eq!(arena.center(f), Vec3::zero() + Mat3::identity() * d);
    }

    #[test]
    fn test_rotated_composition() {
        let mut arena = FrameArena::new();
        let axis = Vec3::unit_z();
        let r1 = arena.add_rotated(FrameId::WORLD, axis, 0.4);
        arena.recalculate(FrameId::WORLD);
        let expected = Mat3::identity() * Mat3::rotation(axis, 0.4);
        assert!(arena.orientation(r1).approx_eq(&expected, 1e-12));
    }

    #[test]
    fn test_nested_translation_through_rotation() {
        let mut arena = FrameArena::new();
        let rotated = arena.add_rotated(FrameId::WORLD, Vec3::unit_z(), crate::core::PI / 2.0);
        let child = arena.add_translated(rotated, Vec3::new(1.0, 0.0, 0.0));
        arena.recalculate(FrameId::WORLD);
        // A 90 degree rotation about z maps +x to +y, so the translated
        // child's center should land on the y-axis.
        assert!(arena.center(child).approx_eq(&Vec3::unit_y(), 1e-10));
    }

    #[test]
    fn test_named_point_transforms_with_frame() {
        let mut arena = FrameArena::new();
        let f = arena.add_translated(FrameId::WORLD, Vec3::new(1.0, 0.0, 0.0));
        arena.add_point(f, "tip", Vec3::new(0.0, 0.0, 1.0));
        arena.recalculate(FrameId::WORLD);
        assert_eq!(arena.point_abs(f, "tip"), Some(Vec3::new(1.0, 0.0, 1.0)));
    }
}
