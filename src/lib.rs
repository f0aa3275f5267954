//! A retained-mode layout engine built on an anchor+offset box model.
//!
//! Every node of a [`TargetTree`] carries anchors (fractions of its parent's size), a center
//! offset and a derived local area. [`Layout`] strategies rewrite that geometry, and a
//! [`LayoutManager`] runs them once per tick in two ordered passes.
//!
//! # Tick overview
//!
//! 1. **Unit size**: every dirty layout measures its natural size contribution
//! 2. **Layout**: every registered layout writes resolved geometry onto its targets
//!
//! The unit-size pass completes for all layouts before the layout pass starts, so no layout
//! reads a half-updated neighbor.
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Single-threaded**: observers are plain `FnMut` closures and handles are `Rc`.
//! - **Self-healing setters**: negative sizes clamp to zero, inverted anchors are swapped and
//!   min/max bounds are kept ordered; changes below [`EPSILON`] are ignored.
//! - **One event per mutation**: bulk updates notify observers at most once.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod foundation;
mod geometry;
mod layout;

pub use config::scene::{
    LayoutConfig, LayoutInfoConfig, NodeConfig, Scene, SceneConfig, SceneSnapshot,
};
pub use foundation::core::{
    Axis, Bound3, EPSILON, Rect, UNFIXED_SENTINEL, Vec2, Vec3, nearly_eq,
};
pub use foundation::error::{LayoutError, LayoutResult};
pub use foundation::observe::{Observers, SubscriptionId};
pub use geometry::offset::{
    LayoutOffset, LayoutOffsetChanged, OffsetFields, OffsetSnapshot, OffsetUnit,
};
pub use geometry::target::{AnchorMode, Target, TargetEvent, TargetGeometry, TargetId};
pub use geometry::tree::TargetTree;
pub use layout::base::{
    DirtyFlag, Layout, LayoutCore, LayoutId, LayoutRef, OperationTargetFlags, shared,
};
pub use layout::info::{LayoutInfo, LayoutInfoChanged, LayoutInfoFields, LayoutInfoSnapshot};
pub use layout::manager::{LayoutManager, TickStats};
pub use layout::offset_fit::OffsetFitLayout;
pub use layout::size_constraint::SizeConstraintLayout;
pub use layout::stack::{StackAlign, StackAxis, StackLayout, StackSettings};
