use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{
    foundation::{
        error::{LayoutError, LayoutResult},
        observe::{Observers, SubscriptionId},
    },
    geometry::{
        target::{TargetEvent, TargetId},
        tree::TargetTree,
    },
};

static NEXT_LAYOUT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a layout object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayoutId(u64);

impl LayoutId {
    fn next() -> Self {
        Self(NEXT_LAYOUT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layout#{}", self.0)
    }
}

bitflags::bitflags! {
    /// Declared read/write set of a layout, for static reasoning about overlapping layouts.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct OperationTargetFlags: u8 {
        /// Position of the bound target.
        const SELF_LOCAL_POS = 1 << 0;
        /// Size/area of the bound target.
        const SELF_LOCAL_AREA = 1 << 1;
        /// Positions of the target's children.
        const CHILDREN_LOCAL_POS = 1 << 2;
        /// Sizes/areas of the target's children.
        const CHILDREN_LOCAL_AREA = 1 << 3;
        /// Position of the target's parent.
        const PARENT_LOCAL_POS = 1 << 4;
        /// Size/area of the target's parent.
        const PARENT_LOCAL_AREA = 1 << 5;

        /// Both self operations.
        const SELF = Self::SELF_LOCAL_POS.bits() | Self::SELF_LOCAL_AREA.bits();
        /// Both children operations.
        const CHILDREN = Self::CHILDREN_LOCAL_POS.bits() | Self::CHILDREN_LOCAL_AREA.bits();
        /// Both parent operations.
        const PARENT = Self::PARENT_LOCAL_POS.bits() | Self::PARENT_LOCAL_AREA.bits();
    }
}

#[derive(Debug)]
struct BindingState {
    dirty: Cell<bool>,
    target_lost: Cell<bool>,
}

/// Shared handle that marks one layout dirty.
///
/// Observers of targets, sizing policies or offsets hold a clone; the layout reads it on the
/// next tick.
#[derive(Clone, Debug)]
pub struct DirtyFlag(Rc<BindingState>);

impl DirtyFlag {
    /// Request a unit-size pass on the next tick.
    pub fn mark(&self) {
        self.0.dirty.set(true);
    }

    /// Current state.
    pub fn is_set(&self) -> bool {
        self.0.dirty.get()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WatchKind {
    Events,
    Info,
}

#[derive(Clone, Copy, Debug)]
struct Watch {
    target: TargetId,
    kind: WatchKind,
    sub: SubscriptionId,
}

/// State every layout carries: identity, target binding, dirty flag and disposal hook.
///
/// Subscriptions live in the tree, not in the core, so dropping a bound core leaves its
/// callbacks registered on the watched targets. Call [`LayoutCore::dispose`] (or
/// [`LayoutCore::unbind`]) with the tree before dropping a layout.
pub struct LayoutCore {
    id: LayoutId,
    target: Option<TargetId>,
    priority: i32,
    state: Rc<BindingState>,
    watches: Vec<Watch>,
    disposed: bool,
    on_disposed: Observers<LayoutId>,
}

impl fmt::Debug for LayoutCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutCore")
            .field("id", &self.id)
            .field("target", &self.target())
            .field("priority", &self.priority)
            .field("dirty", &self.state.dirty.get())
            .field("watches", &self.watches.len())
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl Default for LayoutCore {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCore {
    /// Unbound core; starts dirty so the first tick measures.
    pub fn new() -> Self {
        Self {
            id: LayoutId::next(),
            target: None,
            priority: 0,
            state: Rc::new(BindingState {
                dirty: Cell::new(true),
                target_lost: Cell::new(false),
            }),
            watches: Vec::new(),
            disposed: false,
            on_disposed: Observers::new(),
        }
    }

    /// Identity.
    pub fn id(&self) -> LayoutId {
        self.id
    }

    /// Bound target, or `None` once unbound, disposed or the target was removed.
    pub fn target(&self) -> Option<TargetId> {
        if self.disposed || self.state.target_lost.get() {
            return None;
        }
        self.target
    }

    /// Ordering hint among layouts touching the same target.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Set the ordering hint.
    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    /// Dirty flag.
    pub fn do_changed(&self) -> bool {
        self.state.dirty.get()
    }

    /// Set or clear the dirty flag.
    pub fn set_do_changed(&mut self, changed: bool) {
        self.state.dirty.set(changed);
    }

    /// Handle for external change sources.
    pub fn dirty_flag(&self) -> DirtyFlag {
        DirtyFlag(Rc::clone(&self.state))
    }

    /// True after [`Self::dispose`].
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Bind to `target`, replacing any previous binding, and mark dirty.
    ///
    /// Geometry, children and sizing-policy changes of the target mark the layout dirty;
    /// removal of the target unbinds it.
    pub fn bind(&mut self, tree: &mut TargetTree, target: TargetId) -> LayoutResult<()> {
        debug_assert!(!self.disposed, "{} bound after dispose", self.id);
        self.unbind(tree);
        tree.get(target)?;

        let state = Rc::clone(&self.state);
        let sub = tree.subscribe(target, move |event| match event {
            TargetEvent::Removed => state.target_lost.set(true),
            TargetEvent::GeometryChanged { .. } | TargetEvent::ChildrenChanged => {
                state.dirty.set(true);
            }
        })?;
        self.watches.push(Watch {
            target,
            kind: WatchKind::Events,
            sub,
        });
        self.watch_info(tree, target)?;

        self.state.target_lost.set(false);
        self.target = Some(target);
        self.state.dirty.set(true);
        Ok(())
    }

    /// Also mark dirty when the geometry or children of another target (typically the parent)
    /// change.
    pub fn watch_events(&mut self, tree: &mut TargetTree, id: TargetId) -> LayoutResult<()> {
        let already = self
            .watches
            .iter()
            .any(|w| w.kind == WatchKind::Events && w.target == id);
        if already {
            return Ok(());
        }
        let state = Rc::clone(&self.state);
        let sub = tree.subscribe(id, move |event| {
            if !matches!(event, TargetEvent::Removed) {
                state.dirty.set(true);
            }
        })?;
        self.watches.push(Watch {
            target: id,
            kind: WatchKind::Events,
            sub,
        });
        Ok(())
    }

    /// Also mark dirty when the sizing policy of `id` changes.
    pub fn watch_info(&mut self, tree: &mut TargetTree, id: TargetId) -> LayoutResult<()> {
        if self.is_watching_info(id) {
            return Ok(());
        }
        let state = Rc::clone(&self.state);
        let sub = tree
            .info_mut(id)?
            .subscribe(move |_| state.dirty.set(true));
        self.watches.push(Watch {
            target: id,
            kind: WatchKind::Info,
            sub,
        });
        Ok(())
    }

    /// Keep sizing-policy watches on exactly `ids` (plus the bound target).
    pub fn sync_info_watches(&mut self, tree: &mut TargetTree, ids: &[TargetId]) -> LayoutResult<()> {
        let target = self.target;
        let mut kept = Vec::with_capacity(self.watches.len());
        for w in self.watches.drain(..) {
            let wanted = w.kind == WatchKind::Events
                || Some(w.target) == target
                || ids.contains(&w.target);
            if wanted {
                kept.push(w);
            } else {
                release(tree, w);
            }
        }
        self.watches = kept;
        for &id in ids {
            self.watch_info(tree, id)?;
        }
        Ok(())
    }

    fn is_watching_info(&self, id: TargetId) -> bool {
        self.watches
            .iter()
            .any(|w| w.kind == WatchKind::Info && w.target == id)
    }

    /// Drop every subscription and forget the target.
    pub fn unbind(&mut self, tree: &mut TargetTree) {
        for w in self.watches.drain(..) {
            release(tree, w);
        }
        self.target = None;
    }

    /// Unbind and announce disposal; later calls are no-ops.
    pub fn dispose(&mut self, tree: &mut TargetTree) {
        if self.disposed {
            return;
        }
        self.unbind(tree);
        self.disposed = true;
        self.state.dirty.set(false);
        let id = self.id;
        self.on_disposed.emit(&id);
    }

    /// Listen for disposal.
    pub fn subscribe_disposed(&mut self, f: impl FnMut(&LayoutId) + 'static) -> SubscriptionId {
        self.on_disposed.subscribe(f)
    }

    /// Stop listening for disposal.
    pub fn unsubscribe_disposed(&mut self, sub: SubscriptionId) -> bool {
        self.on_disposed.unsubscribe(sub)
    }
}

fn release(tree: &mut TargetTree, w: Watch) {
    match w.kind {
        WatchKind::Events => {
            tree.unsubscribe(w.target, w.sub);
        }
        WatchKind::Info => {
            if let Ok(info) = tree.info_mut(w.target) {
                info.unsubscribe(w.sub);
            }
        }
    }
}

/// A unit of layout work bound to one target.
///
/// The [`crate::LayoutManager`] drives two passes per tick: [`Layout::update_unit_size`] for
/// dirty layouts, then [`Layout::update_layout`] for all of them. Implementations decide when to
/// clear the dirty flag.
pub trait Layout: fmt::Debug {
    /// Shared state.
    fn core(&self) -> &LayoutCore;

    /// Mutable shared state.
    fn core_mut(&mut self) -> &mut LayoutCore;

    /// Which parts of the tree this layout reads and writes.
    fn operation_target_flags(&self) -> OperationTargetFlags;

    /// Recompute this layout's own natural size contribution.
    fn update_unit_size(&mut self, tree: &mut TargetTree) -> LayoutResult<()>;

    /// Write resolved geometry onto targets.
    fn update_layout(&mut self, tree: &mut TargetTree) -> LayoutResult<()>;

    /// Advisory consistency check; never called by the manager.
    fn validate(&self, tree: &TargetTree) -> LayoutResult<()> {
        let _ = tree;
        Ok(())
    }

    /// Identity.
    fn id(&self) -> LayoutId {
        self.core().id()
    }

    /// Bound target, if still live.
    fn target(&self) -> Option<TargetId> {
        self.core().target()
    }

    /// Ordering hint among layouts touching the same target.
    fn operation_priority(&self) -> i32 {
        self.core().priority()
    }

    /// Dirty flag.
    fn do_changed(&self) -> bool {
        self.core().do_changed()
    }

    /// Set or clear the dirty flag.
    fn set_do_changed(&mut self, changed: bool) {
        self.core_mut().set_do_changed(changed);
    }

    /// Mark dirty and run the layout pass right away, outside the manager's tick.
    fn force_update_layout(&mut self, tree: &mut TargetTree) -> LayoutResult<()> {
        self.set_do_changed(true);
        self.update_layout(tree)
    }

    /// Release the target and notify the manager.
    fn dispose(&mut self, tree: &mut TargetTree) {
        self.core_mut().dispose(tree);
    }
}

/// Live target of `layout`, or a validation error naming the layout.
pub(crate) fn bound_target(layout: &dyn Layout) -> LayoutResult<TargetId> {
    layout
        .target()
        .ok_or_else(|| LayoutError::validation(format!("{} has no live target", layout.id())))
}

/// Shared, dynamically typed layout handle as stored by the manager.
pub type LayoutRef = Rc<RefCell<dyn Layout>>;

/// Wrap a concrete layout for registration while keeping its concrete type.
pub fn shared<L: Layout + 'static>(layout: L) -> Rc<RefCell<L>> {
    Rc::new(RefCell::new(layout))
}

#[cfg(test)]
#[path = "../../tests/unit/layout/base.rs"]
mod tests;
