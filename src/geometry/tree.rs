use crate::{
    foundation::{
        core::{Axis, Vec3},
        error::{LayoutError, LayoutResult},
        observe::SubscriptionId,
    },
    geometry::target::{Target, TargetEvent, TargetGeometry, TargetId},
    layout::info::LayoutInfo,
};

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    target: Option<Target>,
}

/// Arena owning every layout target and the parent/child links between them.
///
/// Geometry writes go through the bulk update operations so each call fires at most one
/// [`TargetEvent::GeometryChanged`]. Nothing here propagates a parent's change to its children;
/// that is the job of whichever layout declares a children operation.
#[derive(Debug, Default)]
pub struct TargetTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl TargetTree {
    /// Empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a target with default geometry (point anchors at the parent center, zero size).
    pub fn insert(&mut self, parent: Option<TargetId>) -> LayoutResult<TargetId> {
        self.insert_with(parent, TargetGeometry::default())
    }

    /// Insert a target with explicit geometry.
    ///
    /// Anchors are normalized, the size is clamped to `>= 0` and `local_pos` is recomputed from
    /// the anchors and offset.
    pub fn insert_with(
        &mut self,
        parent: Option<TargetId>,
        geometry: TargetGeometry,
    ) -> LayoutResult<TargetId> {
        if let Some(p) = parent {
            self.get(p)?;
        }
        let id = self.alloc(Target::new(TargetGeometry::default(), parent));
        if let Some(p) = parent {
            self.attach(p, id)?;
        }
        let (anchor_min, anchor_max) = normalize_anchors(geometry.anchor_min, geometry.anchor_max);
        let resolved = self.resolve(
            id,
            geometry.local_size.clamp_non_negative(),
            anchor_min,
            anchor_max,
            geometry.offset,
        )?;
        self.get_mut(id)?.geometry = resolved;
        Ok(id)
    }

    /// Remove a target and its whole subtree; returns how many targets were removed.
    ///
    /// Each removed target receives [`TargetEvent::Removed`] before it is dropped.
    pub fn remove(&mut self, id: TargetId) -> LayoutResult<usize> {
        let parent = self.get(id)?.parent;
        if let Some(p) = parent {
            self.detach(p, id)?;
        }

        let mut stack = vec![id];
        let mut doomed = Vec::new();
        while let Some(next) = stack.pop() {
            let target = self.get(next)?;
            stack.extend(target.children.iter().copied());
            doomed.push(next);
        }

        for &victim in &doomed {
            let slot = &mut self.slots[victim.index as usize];
            if let Some(mut target) = slot.target.take() {
                target.observers.emit(&TargetEvent::Removed);
            }
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(victim.index);
            self.len -= 1;
        }
        Ok(doomed.len())
    }

    /// Move a target under a new parent (or make it a root).
    ///
    /// Geometry is left untouched; layouts resolve it against the new parent on their next run.
    pub fn set_parent(&mut self, id: TargetId, parent: Option<TargetId>) -> LayoutResult<()> {
        let old = self.get(id)?.parent;
        if old == parent {
            return Ok(());
        }
        if let Some(p) = parent {
            if self.is_ancestor_or_self(id, p)? {
                return Err(LayoutError::validation(format!(
                    "cannot parent {id} under {p}: would create a cycle"
                )));
            }
        }
        if let Some(o) = old {
            self.detach(o, id)?;
        }
        self.get_mut(id)?.parent = parent;
        if let Some(p) = parent {
            self.attach(p, id)?;
        }
        Ok(())
    }

    /// True when `id` resolves to a live target.
    pub fn contains(&self, id: TargetId) -> bool {
        self.get(id).is_ok()
    }

    /// Borrow a target.
    pub fn get(&self, id: TargetId) -> LayoutResult<&Target> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.target.as_ref())
            .ok_or(LayoutError::UnknownTarget(id))
    }

    fn get_mut(&mut self, id: TargetId) -> LayoutResult<&mut Target> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.target.as_mut())
            .ok_or(LayoutError::UnknownTarget(id))
    }

    /// Number of live targets.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the tree holds no targets.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Live targets in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (TargetId, &Target)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.target.as_ref().map(|t| {
                (
                    TargetId {
                        index: i as u32,
                        generation: s.generation,
                    },
                    t,
                )
            })
        })
    }

    /// Targets without a parent.
    pub fn roots(&self) -> Vec<TargetId> {
        self.iter()
            .filter(|(_, t)| t.parent.is_none())
            .map(|(id, _)| id)
            .collect()
    }

    /// Parent of a target.
    pub fn parent(&self, id: TargetId) -> LayoutResult<Option<TargetId>> {
        Ok(self.get(id)?.parent)
    }

    /// Number of ancestors above a target; roots are at depth 0.
    pub fn depth(&self, id: TargetId) -> LayoutResult<usize> {
        let mut depth = 0;
        let mut cur = self.get(id)?.parent;
        while let Some(p) = cur {
            depth += 1;
            cur = self.get(p)?.parent;
        }
        Ok(depth)
    }

    /// Children of a target in attachment order.
    pub fn children(&self, id: TargetId) -> LayoutResult<&[TargetId]> {
        Ok(self.get(id)?.children())
    }

    /// Sizing policy of a target.
    pub fn info(&self, id: TargetId) -> LayoutResult<&LayoutInfo> {
        Ok(&self.get(id)?.info)
    }

    /// Mutable sizing policy of a target; its setters notify their own observers.
    pub fn info_mut(&mut self, id: TargetId) -> LayoutResult<&mut LayoutInfo> {
        Ok(&mut self.get_mut(id)?.info)
    }

    /// Listen for geometry, children and removal events of one target.
    pub fn subscribe(
        &mut self,
        id: TargetId,
        f: impl FnMut(&TargetEvent) + 'static,
    ) -> LayoutResult<SubscriptionId> {
        Ok(self.get_mut(id)?.observers.subscribe(f))
    }

    /// Stop listening; returns `false` if the target or subscription is gone.
    pub fn unsubscribe(&mut self, id: TargetId, sub: SubscriptionId) -> bool {
        self.get_mut(id)
            .map(|t| t.observers.unsubscribe(sub))
            .unwrap_or(false)
    }

    /// Size of the parent, or zero for a root.
    pub fn parent_local_size(&self, id: TargetId) -> LayoutResult<Vec3> {
        match self.get(id)?.parent {
            Some(p) => Ok(self.get(p)?.geometry.local_size),
            None => Ok(Vec3::ZERO),
        }
    }

    /// `parent_size * (anchor_max - anchor_min)`; zero for a root.
    pub fn anchor_area_size(&self, id: TargetId) -> LayoutResult<Vec3> {
        let g = self.get(id)?.geometry;
        Ok(self
            .parent_local_size(id)?
            .mul_elem(g.anchor_max - g.anchor_min))
    }

    /// `(-half, +half)` of the anchor area, centered on the anchor area itself.
    pub fn anchor_area_min_max_pos(&self, id: TargetId) -> LayoutResult<(Vec3, Vec3)> {
        let half = self.anchor_area_size(id)? / 2.0;
        Ok((-half, half))
    }

    /// `(-half(size) + offset, half(size) + offset)`.
    pub fn local_area_min_max_pos(&self, id: TargetId) -> LayoutResult<(Vec3, Vec3)> {
        Ok(self.get(id)?.local_area_min_max_pos())
    }

    /// Outward gaps between anchor area and local area edges.
    ///
    /// Feeding the result back into [`Self::update_local_size_with_anchor_param`] with the same
    /// anchors reproduces the current size and offset.
    pub fn anchor_offset_min_max(&self, id: TargetId) -> LayoutResult<(Vec3, Vec3)> {
        let (anchor_min, anchor_max) = self.anchor_area_min_max_pos(id)?;
        let (local_min, local_max) = self.local_area_min_max_pos(id)?;
        Ok((anchor_min - local_min, local_max - anchor_max))
    }

    /// Center of the anchor area in parent space.
    pub fn anchor_center_pos(&self, id: TargetId) -> LayoutResult<Vec3> {
        let g = self.get(id)?.geometry;
        self.anchor_center_for(id, g.anchor_min, g.anchor_max)
    }

    /// Recompute size and offset from anchors plus outward edge offsets.
    ///
    /// Where the offsets would invert the local area on an axis, the area collapses to zero size
    /// at its midpoint.
    pub fn update_local_size_with_anchor_param(
        &mut self,
        id: TargetId,
        anchor_min: Vec3,
        anchor_max: Vec3,
        offset_min: Vec3,
        offset_max: Vec3,
    ) -> LayoutResult<()> {
        let (anchor_min, anchor_max) = normalize_anchors(anchor_min, anchor_max);
        let parent_size = self.parent_local_size(id)?;
        let half = parent_size.mul_elem(anchor_max - anchor_min) / 2.0;
        let local_min = -half - offset_min;
        let local_max = half + offset_max;
        let size = local_max - local_min;
        if !size.is_non_negative() {
            tracing::debug!(target_id = %id, ?size, "collapsed inverted local area");
        }
        let offset = (local_min + local_max) / 2.0;
        let next = self.resolve(
            id,
            size.clamp_non_negative(),
            anchor_min,
            anchor_max,
            offset,
        )?;
        self.commit(id, next)
    }

    /// Set size, anchors and offset directly; the size is clamped to `>= 0`.
    pub fn update_local_size_with_size_and_anchor_param(
        &mut self,
        id: TargetId,
        size: Vec3,
        anchor_min: Vec3,
        anchor_max: Vec3,
        offset: Vec3,
    ) -> LayoutResult<()> {
        let (anchor_min, anchor_max) = normalize_anchors(anchor_min, anchor_max);
        let next = self.resolve(
            id,
            size.clamp_non_negative(),
            anchor_min,
            anchor_max,
            offset,
        )?;
        self.commit(id, next)
    }

    /// Resize in place, keeping anchors and offset.
    pub fn set_local_size(&mut self, id: TargetId, size: Vec3) -> LayoutResult<()> {
        let g = self.get(id)?.geometry;
        self.update_local_size_with_size_and_anchor_param(
            id,
            size,
            g.anchor_min,
            g.anchor_max,
            g.offset,
        )
    }

    /// Move the local area center to `pos`, adjusting the offset to match.
    pub fn set_local_pos(&mut self, id: TargetId, pos: Vec3) -> LayoutResult<()> {
        let mut next = self.get(id)?.geometry;
        next.offset = pos - self.anchor_center_pos(id)?;
        next.local_pos = pos;
        self.commit(id, next)
    }

    fn resolve(
        &self,
        id: TargetId,
        local_size: Vec3,
        anchor_min: Vec3,
        anchor_max: Vec3,
        offset: Vec3,
    ) -> LayoutResult<TargetGeometry> {
        let center = self.anchor_center_for(id, anchor_min, anchor_max)?;
        Ok(TargetGeometry {
            local_pos: center + offset,
            local_size,
            anchor_min,
            anchor_max,
            offset,
        })
    }

    fn anchor_center_for(
        &self,
        id: TargetId,
        anchor_min: Vec3,
        anchor_max: Vec3,
    ) -> LayoutResult<Vec3> {
        let parent_size = self.parent_local_size(id)?;
        Ok(parent_size.mul_elem((anchor_min + anchor_max) / 2.0 - Vec3::HALF))
    }

    fn commit(&mut self, id: TargetId, next: TargetGeometry) -> LayoutResult<()> {
        let target = self.get_mut(id)?;
        if target.geometry.nearly_eq(&next) {
            return Ok(());
        }
        let old = std::mem::replace(&mut target.geometry, next);
        target.observers.emit(&TargetEvent::GeometryChanged { old });
        Ok(())
    }

    fn alloc(&mut self, target: Target) -> TargetId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.target = Some(target);
            return TargetId {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            target: Some(target),
        });
        TargetId {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    fn attach(&mut self, parent: TargetId, child: TargetId) -> LayoutResult<()> {
        let p = self.get_mut(parent)?;
        p.children.push(child);
        p.observers.emit(&TargetEvent::ChildrenChanged);
        Ok(())
    }

    fn detach(&mut self, parent: TargetId, child: TargetId) -> LayoutResult<()> {
        let p = self.get_mut(parent)?;
        p.children.retain(|c| *c != child);
        p.observers.emit(&TargetEvent::ChildrenChanged);
        Ok(())
    }

    fn is_ancestor_or_self(&self, ancestor: TargetId, mut id: TargetId) -> LayoutResult<bool> {
        loop {
            if id == ancestor {
                return Ok(true);
            }
            match self.get(id)?.parent {
                Some(p) => id = p,
                None => return Ok(false),
            }
        }
    }
}

/// Swap anchor components given in the wrong order.
pub(crate) fn normalize_anchors(anchor_min: Vec3, anchor_max: Vec3) -> (Vec3, Vec3) {
    let mut min = anchor_min;
    let mut max = anchor_max;
    for axis in Axis::ALL {
        if min[axis] > max[axis] {
            tracing::debug!(?axis, min = min[axis], max = max[axis], "swapped inverted anchors");
            std::mem::swap(&mut min[axis], &mut max[axis]);
        }
    }
    (min, max)
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/tree.rs"]
mod tests;
