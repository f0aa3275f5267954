use std::fmt;

use crate::{
    foundation::{
        core::{Rect, Vec3},
        observe::Observers,
    },
    layout::info::LayoutInfo,
};

/// Generational handle of a target inside a [`crate::TargetTree`].
///
/// A handle whose target was removed never resolves again, even if the slot is reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl TargetId {
    /// Rebuild a handle from its parts (diagnostics and tests).
    pub fn from_raw_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Arena slot index.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Slot generation.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Anchor configuration of a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorMode {
    /// `anchor_min ≈ anchor_max`: pinned to one point of the parent.
    Point,
    /// Anchors span a region that scales with the parent.
    Area,
}

/// Geometric state of one target.
///
/// Positions live in the parent's local space, whose origin is the parent's center.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TargetGeometry {
    /// Resolved center of the local area.
    pub local_pos: Vec3,
    /// Resolved extent, `>= 0` on every axis.
    pub local_size: Vec3,
    /// Lower anchor, as a fraction of the parent's size.
    pub anchor_min: Vec3,
    /// Upper anchor, as a fraction of the parent's size.
    pub anchor_max: Vec3,
    /// Center of the local area relative to the center of the anchor area.
    pub offset: Vec3,
}

impl Default for TargetGeometry {
    fn default() -> Self {
        Self {
            local_pos: Vec3::ZERO,
            local_size: Vec3::ZERO,
            anchor_min: Vec3::HALF,
            anchor_max: Vec3::HALF,
            offset: Vec3::ZERO,
        }
    }
}

impl TargetGeometry {
    pub(crate) fn nearly_eq(&self, other: &Self) -> bool {
        self.local_pos.nearly_eq(other.local_pos)
            && self.local_size.nearly_eq(other.local_size)
            && self.anchor_min.nearly_eq(other.anchor_min)
            && self.anchor_max.nearly_eq(other.anchor_max)
            && self.offset.nearly_eq(other.offset)
    }
}

/// Per-target notifications.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TargetEvent {
    /// One bulk geometry update changed at least one component.
    GeometryChanged {
        /// Geometry before the update.
        old: TargetGeometry,
    },
    /// A child was attached or detached.
    ChildrenChanged,
    /// The target is being removed from its tree.
    Removed,
}

/// One node of a [`crate::TargetTree`]: geometry, sizing policy and tree links.
#[derive(Debug)]
pub struct Target {
    pub(crate) geometry: TargetGeometry,
    pub(crate) parent: Option<TargetId>,
    pub(crate) children: Vec<TargetId>,
    pub(crate) info: LayoutInfo,
    pub(crate) observers: Observers<TargetEvent>,
}

impl Target {
    pub(crate) fn new(geometry: TargetGeometry, parent: Option<TargetId>) -> Self {
        Self {
            geometry,
            parent,
            children: Vec::new(),
            info: LayoutInfo::new(),
            observers: Observers::new(),
        }
    }

    /// Full geometry copy.
    pub fn geometry(&self) -> TargetGeometry {
        self.geometry
    }

    /// Resolved center in parent space.
    pub fn local_pos(&self) -> Vec3 {
        self.geometry.local_pos
    }

    /// Resolved extent.
    pub fn local_size(&self) -> Vec3 {
        self.geometry.local_size
    }

    /// Lower anchor.
    pub fn anchor_min(&self) -> Vec3 {
        self.geometry.anchor_min
    }

    /// Upper anchor.
    pub fn anchor_max(&self) -> Vec3 {
        self.geometry.anchor_max
    }

    /// Local area center relative to the anchor area center.
    pub fn offset(&self) -> Vec3 {
        self.geometry.offset
    }

    /// Parent handle; the parent is owned by the tree, not by this target.
    pub fn parent(&self) -> Option<TargetId> {
        self.parent
    }

    /// Children in attachment order.
    pub fn children(&self) -> &[TargetId] {
        &self.children
    }

    /// Sizing policy.
    pub fn info(&self) -> &LayoutInfo {
        &self.info
    }

    /// `Point` when the anchors coincide within epsilon on every axis.
    pub fn anchor_mode(&self) -> AnchorMode {
        if self.geometry.anchor_min.nearly_eq(self.geometry.anchor_max) {
            AnchorMode::Point
        } else {
            AnchorMode::Area
        }
    }

    /// `(min, max)` corners of the local area, relative to the anchor area center.
    pub fn local_area_min_max_pos(&self) -> (Vec3, Vec3) {
        let half = self.geometry.local_size / 2.0;
        (-half + self.geometry.offset, half + self.geometry.offset)
    }

    /// [`LayoutInfo::get_layout_size`] applied to this target's current size.
    pub fn layout_size(&self) -> Vec3 {
        self.info.get_layout_size(self.geometry.local_size)
    }

    /// Local area projected on the xy plane, in parent space.
    pub fn local_rect(&self) -> Rect {
        let TargetGeometry {
            local_pos,
            local_size,
            ..
        } = self.geometry;
        Rect::from_center_size((local_pos.x, local_pos.y), (local_size.x, local_size.y))
    }
}
