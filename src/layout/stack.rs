use std::collections::BTreeMap;

use crate::{
    foundation::{
        core::{Axis, EPSILON, Vec3},
        error::{LayoutError, LayoutResult},
    },
    geometry::{
        offset::{LayoutOffset, OffsetSnapshot},
        target::TargetId,
        tree::TargetTree,
    },
    layout::base::{Layout, LayoutCore, OperationTargetFlags, bound_target},
};

/// Main axis of a [`StackLayout`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackAxis {
    /// Left to right.
    #[default]
    Horizontal,
    /// Top to bottom.
    Vertical,
}

impl StackAxis {
    fn main(self) -> Axis {
        match self {
            StackAxis::Horizontal => Axis::X,
            StackAxis::Vertical => Axis::Y,
        }
    }

    fn cross(self) -> Axis {
        match self {
            StackAxis::Horizontal => Axis::Y,
            StackAxis::Vertical => Axis::X,
        }
    }
}

/// Cross-axis placement of stacked children.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackAlign {
    /// Top edge (horizontal stacks) or left edge (vertical stacks).
    Start,
    /// Centered.
    #[default]
    Center,
    /// Bottom edge (horizontal stacks) or right edge (vertical stacks).
    End,
}

/// Tunables of a [`StackLayout`].
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StackSettings {
    /// Main axis.
    pub axis: StackAxis,
    /// Gap between consecutive children.
    pub spacing: f64,
    /// Cross-axis placement.
    pub align: StackAlign,
    /// Resize the stack's own target to its content on both stack axes.
    pub fit_content: bool,
}

#[derive(Clone, Copy, Debug)]
struct Member {
    id: TargetId,
    order: i32,
    index: usize,
    base: Vec3,
    grow: f64,
    max_main: Option<f64>,
}

/// Arranges the children of its target in a row or column.
///
/// Children with `ignore_layout_group` are skipped; the rest are ordered by
/// `(order_in_group, child index)`. Leftover main-axis space is shared by `size_grow_in_group`
/// weight, never past a child's max size. Placed children get point anchors at the stack center.
#[derive(Debug)]
pub struct StackLayout {
    core: LayoutCore,
    settings: StackSettings,
    padding: LayoutOffset,
    members: Vec<Member>,
    content_size: Vec3,
    // child -> (measured base, size this stack wrote)
    assigned: BTreeMap<TargetId, (Vec3, Vec3)>,
}

impl StackLayout {
    /// Bind a new stack to `target`.
    pub fn new(
        tree: &mut TargetTree,
        target: TargetId,
        settings: StackSettings,
        padding: OffsetSnapshot,
    ) -> LayoutResult<Self> {
        let mut core = LayoutCore::new();
        core.bind(tree, target)?;
        let mut padding = LayoutOffset::from_snapshot(padding);
        let dirty = core.dirty_flag();
        padding.subscribe(move |_| dirty.mark());
        Ok(Self {
            core,
            settings,
            padding,
            members: Vec::new(),
            content_size: Vec3::ZERO,
            assigned: BTreeMap::new(),
        })
    }

    /// Current tunables.
    pub fn settings(&self) -> StackSettings {
        self.settings
    }

    /// Replace the tunables; marks the stack dirty when they differ.
    pub fn set_settings(&mut self, settings: StackSettings) {
        if self.settings != settings {
            self.settings = settings;
            self.set_do_changed(true);
        }
    }

    /// Inner padding.
    pub fn padding(&self) -> &LayoutOffset {
        &self.padding
    }

    /// Mutable inner padding; changes mark the stack dirty.
    pub fn padding_mut(&mut self) -> &mut LayoutOffset {
        &mut self.padding
    }

    /// Size of the content plus padding, from the last unit-size pass.
    pub fn content_size(&self) -> Vec3 {
        self.content_size
    }

    /// Participating children in placement order, from the last unit-size pass.
    pub fn members(&self) -> Vec<TargetId> {
        self.members.iter().map(|m| m.id).collect()
    }

    fn padding_totals(&self, size: Vec3) -> (Vec3, Vec3) {
        self.padding.insets_px(size)
    }

    fn measure(&mut self, tree: &mut TargetTree) -> LayoutResult<()> {
        let target = bound_target(self)?;
        let children = tree.children(target)?.to_vec();
        let main = self.settings.axis.main();
        let cross = self.settings.axis.cross();

        let mut members = Vec::with_capacity(children.len());
        for (index, &id) in children.iter().enumerate() {
            let child = tree.get(id)?;
            let info = child.info();
            if info.ignore_layout_group() {
                continue;
            }
            let base = match self.assigned.get(&id) {
                Some(&(base, written)) if child.local_size().nearly_eq(written) => base,
                _ => child.layout_size(),
            };
            members.push(Member {
                id,
                order: info.order_in_group(),
                index,
                base,
                grow: info.size_grow_in_group(),
                max_main: info.max_size().get(main),
            });
        }
        members.sort_by_key(|m| (m.order, m.index));
        self.core.sync_info_watches(tree, &children)?;
        self.assigned
            .retain(|id, _| members.iter().any(|m| m.id == *id));

        let self_size = tree.get(target)?.local_size();
        let (pad_min, pad_max) = self.padding_totals(self_size);
        let mut content = self_size;
        content[main] = members.iter().map(|m| m.base[main]).sum::<f64>()
            + self.gaps(members.len())
            + pad_min[main]
            + pad_max[main];
        content[cross] = members.iter().map(|m| m.base[cross]).fold(0.0, f64::max)
            + pad_min[cross]
            + pad_max[cross];
        self.content_size = content;
        self.members = members;
        Ok(())
    }

    fn gaps(&self, count: usize) -> f64 {
        (count.saturating_sub(1) as f64) * self.settings.spacing
    }

    fn main_sizes(&self, available: f64) -> Vec<f64> {
        let main = self.settings.axis.main();
        let mut sizes: Vec<f64> = self.members.iter().map(|m| m.base[main]).collect();
        let natural: f64 = sizes.iter().sum();
        let mut remaining = (available - natural - self.gaps(sizes.len())).max(0.0);

        let mut open: Vec<usize> = (0..sizes.len())
            .filter(|&i| self.members[i].grow > 0.0)
            .collect();
        while remaining > EPSILON && !open.is_empty() {
            let total: f64 = open.iter().map(|&i| self.members[i].grow).sum();
            let mut spent = 0.0;
            let mut still_open = Vec::with_capacity(open.len());
            for &i in &open {
                let share = remaining * self.members[i].grow / total;
                let room = self.members[i]
                    .max_main
                    .map_or(f64::INFINITY, |max| (max - sizes[i]).max(0.0));
                let take = share.min(room);
                sizes[i] += take;
                spent += take;
                if take + EPSILON >= share {
                    still_open.push(i);
                }
            }
            remaining -= spent;
            if still_open.len() == open.len() {
                break;
            }
            open = still_open;
        }
        sizes
    }

    fn cross_center(&self, lo: f64, hi: f64, extent: f64) -> f64 {
        let (first, last) = match self.settings.axis {
            // Start is the top edge, which is the high end of y.
            StackAxis::Horizontal => (hi - extent / 2.0, lo + extent / 2.0),
            StackAxis::Vertical => (lo + extent / 2.0, hi - extent / 2.0),
        };
        match self.settings.align {
            StackAlign::Start => first,
            StackAlign::Center => (lo + hi) / 2.0,
            StackAlign::End => last,
        }
    }
}

impl Layout for StackLayout {
    fn core(&self) -> &LayoutCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut LayoutCore {
        &mut self.core
    }

    fn operation_target_flags(&self) -> OperationTargetFlags {
        if self.settings.fit_content {
            OperationTargetFlags::CHILDREN | OperationTargetFlags::SELF_LOCAL_AREA
        } else {
            OperationTargetFlags::CHILDREN
        }
    }

    fn update_unit_size(&mut self, tree: &mut TargetTree) -> LayoutResult<()> {
        self.measure(tree)
    }

    fn update_layout(&mut self, tree: &mut TargetTree) -> LayoutResult<()> {
        let target = bound_target(self)?;
        let main = self.settings.axis.main();
        let cross = self.settings.axis.cross();

        if self.settings.fit_content {
            let mut size = tree.get(target)?.local_size();
            size[main] = self.content_size[main];
            size[cross] = self.content_size[cross];
            tree.set_local_size(target, size)?;
        }

        let self_size = tree.get(target)?.local_size();
        let (pad_min, pad_max) = self.padding_totals(self_size);
        let lo = -self_size / 2.0 + pad_min;
        let hi = self_size / 2.0 - pad_max;
        let sizes = self.main_sizes(hi[main] - lo[main]);

        let mut cursor = match self.settings.axis {
            StackAxis::Horizontal => lo[main],
            StackAxis::Vertical => hi[main],
        };
        for (member, main_size) in self.members.iter().zip(sizes) {
            let Ok(child) = tree.get(member.id) else {
                continue;
            };
            let mut size = member.base;
            size[main] = main_size;
            let mut center = child.offset();
            center[main] = match self.settings.axis {
                StackAxis::Horizontal => cursor + main_size / 2.0,
                StackAxis::Vertical => cursor - main_size / 2.0,
            };
            center[cross] = self.cross_center(lo[cross], hi[cross], size[cross]);
            match self.settings.axis {
                StackAxis::Horizontal => cursor += main_size + self.settings.spacing,
                StackAxis::Vertical => cursor -= main_size + self.settings.spacing,
            }

            tree.update_local_size_with_size_and_anchor_param(
                member.id,
                size,
                Vec3::HALF,
                Vec3::HALF,
                center,
            )?;
            let written = tree.get(member.id)?.local_size();
            self.assigned.insert(member.id, (member.base, written));
        }
        self.set_do_changed(false);
        Ok(())
    }

    fn validate(&self, tree: &TargetTree) -> LayoutResult<()> {
        let target = bound_target(self)?;
        if self.settings.spacing < 0.0 {
            return Err(LayoutError::validation(format!(
                "negative stack spacing {}",
                self.settings.spacing
            )));
        }
        let main = self.settings.axis.main();
        let self_size = tree.get(target)?.local_size();
        if !self.settings.fit_content && self.content_size[main] > self_size[main] + EPSILON {
            return Err(LayoutError::validation(format!(
                "stack content {} overflows target {} on {main:?}",
                self.content_size[main], self_size[main]
            )));
        }
        Ok(())
    }

    /// Re-measures the children before placing them, so a forced update never uses stale sizes.
    fn force_update_layout(&mut self, tree: &mut TargetTree) -> LayoutResult<()> {
        self.set_do_changed(true);
        self.update_unit_size(tree)?;
        self.update_layout(tree)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/stack.rs"]
mod tests;
