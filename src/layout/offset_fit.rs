use crate::{
    foundation::{
        core::{Axis, Vec3},
        error::LayoutResult,
    },
    geometry::{
        offset::{LayoutOffset, OffsetSnapshot},
        target::TargetId,
        tree::TargetTree,
    },
    layout::base::{Layout, LayoutCore, OperationTargetFlags, bound_target},
};

/// Stretches its target over the parent's xy area, inset by a [`LayoutOffset`].
///
/// Depth anchors and depth padding are preserved. Offset mutations and parent resizes mark the
/// layout dirty.
#[derive(Debug)]
pub struct OffsetFitLayout {
    core: LayoutCore,
    offset: LayoutOffset,
    resolved: Option<(Vec3, Vec3)>,
}

impl OffsetFitLayout {
    /// Bind a new layout to `target` with the given insets.
    pub fn new(
        tree: &mut TargetTree,
        target: TargetId,
        offset: OffsetSnapshot,
    ) -> LayoutResult<Self> {
        let mut core = LayoutCore::new();
        core.bind(tree, target)?;
        if let Some(parent) = tree.parent(target)? {
            core.watch_events(tree, parent)?;
        }
        let mut offset = LayoutOffset::from_snapshot(offset);
        let dirty = core.dirty_flag();
        offset.subscribe(move |_| dirty.mark());
        Ok(Self {
            core,
            offset,
            resolved: None,
        })
    }

    /// Current insets.
    pub fn offset(&self) -> &LayoutOffset {
        &self.offset
    }

    /// Mutable insets; changes mark the layout dirty.
    pub fn offset_mut(&mut self) -> &mut LayoutOffset {
        &mut self.offset
    }

    /// Outward anchor offsets from the last pass.
    pub fn resolved_offsets(&self) -> Option<(Vec3, Vec3)> {
        self.resolved
    }

    fn measure(&self, tree: &TargetTree) -> LayoutResult<(Vec3, Vec3)> {
        let parent_size = tree.parent_local_size(bound_target(self)?)?;
        Ok(self.offset.resolve(parent_size))
    }
}

impl Layout for OffsetFitLayout {
    fn core(&self) -> &LayoutCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut LayoutCore {
        &mut self.core
    }

    fn operation_target_flags(&self) -> OperationTargetFlags {
        OperationTargetFlags::SELF
    }

    fn update_unit_size(&mut self, tree: &mut TargetTree) -> LayoutResult<()> {
        self.resolved = Some(self.measure(tree)?);
        Ok(())
    }

    fn update_layout(&mut self, tree: &mut TargetTree) -> LayoutResult<()> {
        let target = bound_target(self)?;
        // Re-resolved here: a ratio inset must follow a parent resized earlier in this pass.
        let (mut offset_min, mut offset_max) = self.measure(tree)?;
        self.resolved = Some((offset_min, offset_max));
        let current = tree.get(target)?.geometry();
        let (depth_min, depth_max) = tree.anchor_offset_min_max(target)?;
        offset_min[Axis::Z] = depth_min[Axis::Z];
        offset_max[Axis::Z] = depth_max[Axis::Z];

        tree.update_local_size_with_anchor_param(
            target,
            Vec3::new(0.0, 0.0, current.anchor_min.z),
            Vec3::new(1.0, 1.0, current.anchor_max.z),
            offset_min,
            offset_max,
        )?;
        self.set_do_changed(false);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/offset_fit.rs"]
mod tests;
