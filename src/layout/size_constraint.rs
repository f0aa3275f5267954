use crate::{
    foundation::{
        core::{Axis, Vec3},
        error::{LayoutError, LayoutResult},
    },
    geometry::{target::TargetId, tree::TargetTree},
    layout::base::{Layout, LayoutCore, OperationTargetFlags, bound_target},
};

/// Clamps its target's size to the target's [`crate::LayoutInfo`] floor and ceiling.
///
/// Anchors and offset are left alone; only the size is rewritten.
#[derive(Debug)]
pub struct SizeConstraintLayout {
    core: LayoutCore,
    resolved: Option<Vec3>,
}

impl SizeConstraintLayout {
    /// Bind a new layout to `target`.
    pub fn new(tree: &mut TargetTree, target: TargetId) -> LayoutResult<Self> {
        let mut core = LayoutCore::new();
        core.bind(tree, target)?;
        Ok(Self {
            core,
            resolved: None,
        })
    }

    /// Size computed by the last unit-size pass.
    pub fn resolved_size(&self) -> Option<Vec3> {
        self.resolved
    }

    fn measure(&self, tree: &TargetTree) -> LayoutResult<Vec3> {
        Ok(tree.get(bound_target(self)?)?.layout_size())
    }
}

impl Layout for SizeConstraintLayout {
    fn core(&self) -> &LayoutCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut LayoutCore {
        &mut self.core
    }

    fn operation_target_flags(&self) -> OperationTargetFlags {
        OperationTargetFlags::SELF_LOCAL_AREA
    }

    fn update_unit_size(&mut self, tree: &mut TargetTree) -> LayoutResult<()> {
        self.resolved = Some(self.measure(tree)?);
        Ok(())
    }

    fn update_layout(&mut self, tree: &mut TargetTree) -> LayoutResult<()> {
        let target = bound_target(self)?;
        let size = match self.resolved {
            Some(size) => size,
            None => self.measure(tree)?,
        };
        tree.set_local_size(target, size)?;
        self.set_do_changed(false);
        Ok(())
    }

    fn validate(&self, tree: &TargetTree) -> LayoutResult<()> {
        let info = tree.info(bound_target(self)?)?;
        for axis in Axis::ALL {
            if let (Some(min), Some(ceiling)) = (info.min_size().get(axis), info.layout_size().get(axis))
            {
                if ceiling < min {
                    return Err(LayoutError::validation(format!(
                        "{axis:?} ceiling {ceiling} is below min size {min}; the ceiling wins"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Measures before laying out, so a forced update never applies a stale cached size.
    fn force_update_layout(&mut self, tree: &mut TargetTree) -> LayoutResult<()> {
        self.set_do_changed(true);
        self.update_unit_size(tree)?;
        self.update_layout(tree)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/size_constraint.rs"]
mod tests;
