use crate::foundation::{
    core::{Axis, Bound3, Vec3, nearly_eq},
    observe::{Observers, SubscriptionId},
};

bitflags::bitflags! {
    /// Which [`LayoutInfo`] fields a mutation touched.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct LayoutInfoFields: u8 {
        /// [`LayoutInfo::layout_size`].
        const LAYOUT_SIZE = 1 << 0;
        /// [`LayoutInfo::min_size`].
        const MIN_SIZE = 1 << 1;
        /// [`LayoutInfo::max_size`].
        const MAX_SIZE = 1 << 2;
        /// [`LayoutInfo::ignore_layout_group`].
        const IGNORE_LAYOUT_GROUP = 1 << 3;
        /// [`LayoutInfo::size_grow_in_group`].
        const SIZE_GROW_IN_GROUP = 1 << 4;
        /// [`LayoutInfo::order_in_group`].
        const ORDER_IN_GROUP = 1 << 5;
    }
}

/// Value copy of every [`LayoutInfo`] field.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LayoutInfoSnapshot {
    /// Per-axis size ceiling.
    pub layout_size: Bound3,
    /// Per-axis size floor.
    pub min_size: Bound3,
    /// Per-axis upper bound honored by layout groups when growing.
    pub max_size: Bound3,
    /// Skip this target when a parent group arranges its children.
    pub ignore_layout_group: bool,
    /// Relative share of leftover group space, `>= 0`.
    pub size_grow_in_group: f64,
    /// Sort key among siblings in a group.
    pub order_in_group: i32,
}

impl Default for LayoutInfoSnapshot {
    fn default() -> Self {
        Self {
            layout_size: Bound3::UNFIXED,
            min_size: Bound3::UNFIXED,
            max_size: Bound3::UNFIXED,
            ignore_layout_group: false,
            size_grow_in_group: 0.0,
            order_in_group: 0,
        }
    }
}

impl LayoutInfoSnapshot {
    /// Copy with the setter rules applied: negative ceiling and floor axes unfixed, min/max
    /// ordered, grow weight `>= 0`.
    pub fn normalized(&self) -> Self {
        let (min_size, max_size) = ordered_min_max(self.min_size, self.max_size);
        Self {
            layout_size: drop_negative(self.layout_size),
            min_size,
            max_size,
            size_grow_in_group: clamp_grow(self.size_grow_in_group),
            ..*self
        }
    }

    /// Fields that differ from `other` beyond [`crate::EPSILON`].
    pub fn diff(&self, other: &Self) -> LayoutInfoFields {
        let mut changed = LayoutInfoFields::empty();
        changed.set(
            LayoutInfoFields::LAYOUT_SIZE,
            !self.layout_size.nearly_eq(other.layout_size),
        );
        changed.set(
            LayoutInfoFields::MIN_SIZE,
            !self.min_size.nearly_eq(other.min_size),
        );
        changed.set(
            LayoutInfoFields::MAX_SIZE,
            !self.max_size.nearly_eq(other.max_size),
        );
        changed.set(
            LayoutInfoFields::IGNORE_LAYOUT_GROUP,
            self.ignore_layout_group != other.ignore_layout_group,
        );
        changed.set(
            LayoutInfoFields::SIZE_GROW_IN_GROUP,
            !nearly_eq(self.size_grow_in_group, other.size_grow_in_group),
        );
        changed.set(
            LayoutInfoFields::ORDER_IN_GROUP,
            self.order_in_group != other.order_in_group,
        );
        changed
    }
}

/// Notification fired once per logical [`LayoutInfo`] mutation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutInfoChanged {
    /// Values before the mutation.
    pub old: LayoutInfoSnapshot,
    /// Fields that changed.
    pub changed: LayoutInfoFields,
}

/// Per-target sizing policy: a size ceiling, min/max bounds and group participation.
///
/// Every setter keeps `min_size <= max_size` on axes where both are fixed and fires at most one
/// [`LayoutInfoChanged`] per call.
#[derive(Debug, Default)]
pub struct LayoutInfo {
    values: LayoutInfoSnapshot,
    observers: Observers<LayoutInfoChanged>,
}

impl LayoutInfo {
    /// Every bound unfixed, default group settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a snapshot, without notifying anyone. The values are normalized as by
    /// [`LayoutInfo::assign`].
    pub fn from_snapshot(values: LayoutInfoSnapshot) -> Self {
        Self {
            values: values.normalized(),
            observers: Observers::new(),
        }
    }

    /// Value copy of the current fields.
    pub fn snapshot(&self) -> LayoutInfoSnapshot {
        self.values
    }

    /// Per-axis size ceiling.
    pub fn layout_size(&self) -> Bound3 {
        self.values.layout_size
    }

    /// Per-axis size floor.
    pub fn min_size(&self) -> Bound3 {
        self.values.min_size
    }

    /// Per-axis upper bound.
    pub fn max_size(&self) -> Bound3 {
        self.values.max_size
    }

    /// Group participation flag.
    pub fn ignore_layout_group(&self) -> bool {
        self.values.ignore_layout_group
    }

    /// Grow weight inside a group.
    pub fn size_grow_in_group(&self) -> f64 {
        self.values.size_grow_in_group
    }

    /// Sort key inside a group.
    pub fn order_in_group(&self) -> i32 {
        self.values.order_in_group
    }

    /// Effective size for a target whose natural size is `local_size`.
    ///
    /// The floor (`min_size`) is applied first and the ceiling (`layout_size`) last, so a
    /// ceiling below the floor wins.
    pub fn get_layout_size(&self, local_size: Vec3) -> Vec3 {
        let floored = local_size.max_elem(self.values.min_size.or(local_size));
        floored.min_elem(self.values.layout_size.or(floored))
    }

    /// Set the ceiling; negative axes reset to unfixed.
    pub fn set_layout_size(&mut self, layout_size: Bound3) {
        let mut next = self.values;
        next.layout_size = drop_negative(layout_size);
        self.apply(next);
    }

    /// Set the floor, re-checking it against the current max.
    pub fn set_min_size(&mut self, min_size: Bound3) {
        self.set_min_max_size(min_size, self.values.max_size);
    }

    /// Set the upper bound, re-checking it against the current min.
    pub fn set_max_size(&mut self, max_size: Bound3) {
        self.set_min_max_size(self.values.min_size, max_size);
    }

    /// Set both bounds with a single notification.
    ///
    /// An axis whose max is unfixed or `<= 0` leaves max unfixed and passes min through. Otherwise
    /// min becomes `min(min, max)` and max becomes `max(min, max)`.
    pub fn set_min_max_size(&mut self, min_size: Bound3, max_size: Bound3) {
        let mut next = self.values;
        (next.min_size, next.max_size) = ordered_min_max(min_size, max_size);
        self.apply(next);
    }

    /// Toggle group participation.
    pub fn set_ignore_layout_group(&mut self, ignore: bool) {
        let mut next = self.values;
        next.ignore_layout_group = ignore;
        self.apply(next);
    }

    /// Set the grow weight; negative or NaN weights become zero.
    pub fn set_size_grow_in_group(&mut self, grow: f64) {
        let mut next = self.values;
        next.size_grow_in_group = clamp_grow(grow);
        self.apply(next);
    }

    /// Set the sort key.
    pub fn set_order_in_group(&mut self, order: i32) {
        let mut next = self.values;
        next.order_in_group = order;
        self.apply(next);
    }

    /// Copy every field from `other` with a single notification.
    ///
    /// The copy goes through the same rules as the individual setters: negative ceilings and
    /// floors become unfixed, min/max are ordered and the grow weight is clamped.
    pub fn assign(&mut self, other: &LayoutInfoSnapshot) {
        self.apply(other.normalized());
    }

    /// Listen for changes.
    pub fn subscribe(&mut self, f: impl FnMut(&LayoutInfoChanged) + 'static) -> SubscriptionId {
        self.observers.subscribe(f)
    }

    /// Stop listening.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    fn apply(&mut self, next: LayoutInfoSnapshot) {
        let changed = self.values.diff(&next);
        if changed.is_empty() {
            return;
        }
        let old = std::mem::replace(&mut self.values, next);
        self.observers.emit(&LayoutInfoChanged { old, changed });
    }
}

fn ordered_min_max(min_size: Bound3, max_size: Bound3) -> (Bound3, Bound3) {
    let mut min_out = drop_negative(min_size);
    let mut max_out = Bound3::UNFIXED;
    for axis in Axis::ALL {
        let min = min_out.get(axis);
        let (min, max) = match max_size.get(axis) {
            Some(max) if max > 0.0 => (
                min.map(|v| v.min(max)),
                Some(min.map_or(max, |v| v.max(max))),
            ),
            _ => (min, None),
        };
        min_out.set(axis, min);
        max_out.set(axis, max);
    }
    (min_out, max_out)
}

fn clamp_grow(grow: f64) -> f64 {
    if grow.is_nan() { 0.0 } else { grow.max(0.0) }
}

fn drop_negative(b: Bound3) -> Bound3 {
    let keep = |v: Option<f64>| v.filter(|v| *v >= 0.0);
    Bound3::new(keep(b.x), keep(b.y), keep(b.z))
}

#[cfg(test)]
#[path = "../../tests/unit/layout/info.rs"]
mod tests;
