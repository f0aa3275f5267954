use crate::foundation::{
    core::{Vec3, nearly_eq},
    observe::{Observers, SubscriptionId},
};

/// How [`LayoutOffset`] values are interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetUnit {
    /// Absolute pixels.
    #[default]
    Pixel,
    /// Fraction of the parent's size on the matching axis.
    Ratio,
}

bitflags::bitflags! {
    /// Which [`LayoutOffset`] fields a mutation touched.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct OffsetFields: u8 {
        /// Left inset.
        const LEFT = 1 << 0;
        /// Right inset.
        const RIGHT = 1 << 1;
        /// Top inset.
        const TOP = 1 << 2;
        /// Bottom inset.
        const BOTTOM = 1 << 3;
        /// Unit mode.
        const UNIT = 1 << 4;
    }
}

/// Value copy of a [`LayoutOffset`].
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OffsetSnapshot {
    /// Left inset.
    pub left: f64,
    /// Right inset.
    pub right: f64,
    /// Top (+y) inset.
    pub top: f64,
    /// Bottom (-y) inset.
    pub bottom: f64,
    /// Unit mode.
    pub unit: OffsetUnit,
}

impl OffsetSnapshot {
    fn diff(&self, other: &Self) -> OffsetFields {
        let mut changed = OffsetFields::empty();
        changed.set(OffsetFields::LEFT, !nearly_eq(self.left, other.left));
        changed.set(OffsetFields::RIGHT, !nearly_eq(self.right, other.right));
        changed.set(OffsetFields::TOP, !nearly_eq(self.top, other.top));
        changed.set(OffsetFields::BOTTOM, !nearly_eq(self.bottom, other.bottom));
        changed.set(OffsetFields::UNIT, self.unit != other.unit);
        changed
    }
}

/// Notification fired once per logical [`LayoutOffset`] mutation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutOffsetChanged {
    /// Values before the mutation.
    pub old: OffsetSnapshot,
    /// Fields that changed.
    pub changed: OffsetFields,
}

/// Left/right/top/bottom insets with a unit mode.
#[derive(Debug, Default)]
pub struct LayoutOffset {
    values: OffsetSnapshot,
    observers: Observers<LayoutOffsetChanged>,
}

impl LayoutOffset {
    /// All insets zero, pixel units.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a snapshot, without notifying anyone.
    pub fn from_snapshot(values: OffsetSnapshot) -> Self {
        Self {
            values,
            observers: Observers::new(),
        }
    }

    /// Value copy of the current fields.
    pub fn snapshot(&self) -> OffsetSnapshot {
        self.values
    }

    /// Left inset.
    pub fn left(&self) -> f64 {
        self.values.left
    }

    /// Right inset.
    pub fn right(&self) -> f64 {
        self.values.right
    }

    /// Top inset.
    pub fn top(&self) -> f64 {
        self.values.top
    }

    /// Bottom inset.
    pub fn bottom(&self) -> f64 {
        self.values.bottom
    }

    /// Unit mode.
    pub fn unit(&self) -> OffsetUnit {
        self.values.unit
    }

    /// Set the left inset.
    pub fn set_left(&mut self, v: f64) {
        let mut next = self.values;
        next.left = v;
        self.apply(next);
    }

    /// Set the right inset.
    pub fn set_right(&mut self, v: f64) {
        let mut next = self.values;
        next.right = v;
        self.apply(next);
    }

    /// Set the top inset.
    pub fn set_top(&mut self, v: f64) {
        let mut next = self.values;
        next.top = v;
        self.apply(next);
    }

    /// Set the bottom inset.
    pub fn set_bottom(&mut self, v: f64) {
        let mut next = self.values;
        next.bottom = v;
        self.apply(next);
    }

    /// Switch unit mode.
    pub fn set_unit(&mut self, unit: OffsetUnit) {
        let mut next = self.values;
        next.unit = unit;
        self.apply(next);
    }

    /// Set all four insets with a single notification.
    pub fn set_offsets(&mut self, left: f64, right: f64, top: f64, bottom: f64) {
        let next = OffsetSnapshot {
            left,
            right,
            top,
            bottom,
            unit: self.values.unit,
        };
        self.apply(next);
    }

    /// Set left and right with a single notification.
    pub fn set_horizontal_offsets(&mut self, left: f64, right: f64) {
        let mut next = self.values;
        next.left = left;
        next.right = right;
        self.apply(next);
    }

    /// Set top and bottom with a single notification.
    pub fn set_vertical_offsets(&mut self, top: f64, bottom: f64) {
        let mut next = self.values;
        next.top = top;
        next.bottom = bottom;
        self.apply(next);
    }

    /// Insets in pixels for a parent of `parent_size`, as `(min, max)` along x and y.
    ///
    /// `min` holds `(left, bottom)`, `max` holds `(right, top)`; z is always zero.
    pub fn insets_px(&self, parent_size: Vec3) -> (Vec3, Vec3) {
        let v = &self.values;
        let (sx, sy) = match v.unit {
            OffsetUnit::Pixel => (1.0, 1.0),
            OffsetUnit::Ratio => (parent_size.x, parent_size.y),
        };
        (
            Vec3::new(v.left * sx, v.bottom * sy, 0.0),
            Vec3::new(v.right * sx, v.top * sy, 0.0),
        )
    }

    /// Outward anchor offsets for a parent of `parent_size`.
    ///
    /// Insets shrink the local area, so the outward gaps are their negation.
    pub fn resolve(&self, parent_size: Vec3) -> (Vec3, Vec3) {
        let (min, max) = self.insets_px(parent_size);
        (-min, -max)
    }

    /// Listen for changes.
    pub fn subscribe(&mut self, f: impl FnMut(&LayoutOffsetChanged) + 'static) -> SubscriptionId {
        self.observers.subscribe(f)
    }

    /// Stop listening.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    fn apply(&mut self, next: OffsetSnapshot) {
        let changed = self.values.diff(&next);
        if changed.is_empty() {
            return;
        }
        let old = std::mem::replace(&mut self.values, next);
        self.observers.emit(&LayoutOffsetChanged { old, changed });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/offset.rs"]
mod tests;
