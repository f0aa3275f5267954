use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use crate::{
    foundation::observe::SubscriptionId,
    geometry::{target::TargetId, tree::TargetTree},
    layout::base::{Layout, LayoutId, LayoutRef},
};

/// Counters for one [`LayoutManager::calculate_layouts`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct TickStats {
    /// Layouts that ran the unit-size pass.
    pub unit_size_runs: usize,
    /// Layouts that ran the layout pass.
    pub layout_runs: usize,
    /// Visits skipped because the layout had no live target, was disposed or was busy.
    pub skipped: usize,
    /// Pass invocations that returned an error (logged, not propagated).
    pub failures: usize,
}

#[derive(Debug)]
struct Registered {
    layout: LayoutRef,
    disposal: SubscriptionId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pass {
    UnitSize,
    Layout,
}

/// Owns the set of active layouts and drives the per-tick passes.
///
/// Disposal of a registered layout removes it automatically through a disposal subscription,
/// so a layout disposed in the middle of a tick is skipped by the remaining visits.
#[derive(Debug, Default)]
pub struct LayoutManager {
    layouts: BTreeMap<LayoutId, Registered>,
    disposed: Rc<RefCell<Vec<LayoutId>>>,
}

impl LayoutManager {
    /// Empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a layout. Registering the same layout twice, or a disposed one, is misuse:
    /// it asserts in debug builds and is ignored (returning `false`) otherwise.
    pub fn entry(&mut self, layout: LayoutRef) -> bool {
        self.drain_disposed();
        let Ok(mut guard) = layout.try_borrow_mut() else {
            tracing::warn!("cannot register a layout that is currently borrowed");
            return false;
        };
        let id = guard.id();
        if self.layouts.contains_key(&id) {
            debug_assert!(false, "{id} registered twice");
            tracing::warn!(layout = %id, "layout registered twice; ignoring");
            return false;
        }
        if guard.core().is_disposed() {
            debug_assert!(false, "{id} registered after dispose");
            tracing::warn!(layout = %id, "disposed layout registered; ignoring");
            return false;
        }

        let inbox = Rc::clone(&self.disposed);
        let disposal = guard
            .core_mut()
            .subscribe_disposed(move |id| inbox.borrow_mut().push(*id));
        drop(guard);

        self.layouts.insert(id, Registered { layout, disposal });
        tracing::debug!(layout = %id, "layout registered");
        true
    }

    /// Deregister a layout; returns `false` if it was not registered.
    pub fn exit(&mut self, id: LayoutId) -> bool {
        self.drain_disposed();
        let Some(entry) = self.layouts.remove(&id) else {
            return false;
        };
        if let Ok(mut layout) = entry.layout.try_borrow_mut() {
            layout.core_mut().unsubscribe_disposed(entry.disposal);
        }
        tracing::debug!(layout = %id, "layout deregistered");
        true
    }

    /// True when `id` is registered and not disposed.
    pub fn contains(&self, id: LayoutId) -> bool {
        self.layouts.contains_key(&id) && !self.disposed.borrow().contains(&id)
    }

    /// Number of registered, undisposed layouts.
    pub fn len(&self) -> usize {
        let pending = self.disposed.borrow();
        self.layouts
            .keys()
            .filter(|id| !pending.contains(id))
            .count()
    }

    /// True when no layout is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run one tick: the unit-size pass over dirty layouts, then the layout pass over all.
    ///
    /// The unit-size pass completes for every layout before the layout pass starts. Both passes
    /// visit layouts parent first (by the depth of their target, then by [`LayoutId`]), so a
    /// layout that resizes a parent runs before layouts that read that parent. A layout that
    /// fails is logged and counted; the remaining layouts still run.
    #[tracing::instrument(level = "debug", skip_all, fields(layouts = self.layouts.len()))]
    pub fn calculate_layouts(&mut self, tree: &mut TargetTree) -> TickStats {
        self.drain_disposed();
        let ids = self.visit_order(tree);
        let mut stats = TickStats::default();
        self.run_pass(Pass::UnitSize, &ids, tree, &mut stats);
        self.run_pass(Pass::Layout, &ids, tree, &mut stats);
        tracing::debug!(
            unit_size_runs = stats.unit_size_runs,
            layout_runs = stats.layout_runs,
            skipped = stats.skipped,
            failures = stats.failures,
            "layouts calculated"
        );
        stats
    }

    fn run_pass(
        &mut self,
        pass: Pass,
        ids: &[LayoutId],
        tree: &mut TargetTree,
        stats: &mut TickStats,
    ) {
        for &id in ids {
            self.drain_disposed();
            let Some(layout) = self.layouts.get(&id).map(|r| Rc::clone(&r.layout)) else {
                stats.skipped += 1;
                continue;
            };
            let Ok(mut layout) = layout.try_borrow_mut() else {
                tracing::warn!(layout = %id, ?pass, "layout busy during tick; skipping");
                stats.skipped += 1;
                continue;
            };
            let Some(target) = live_target(&*layout, tree) else {
                stats.skipped += 1;
                continue;
            };

            let result = match pass {
                Pass::UnitSize if !layout.do_changed() => continue,
                Pass::UnitSize => layout.update_unit_size(tree),
                Pass::Layout => layout.update_layout(tree),
            };
            match result {
                Ok(()) => match pass {
                    Pass::UnitSize => stats.unit_size_runs += 1,
                    Pass::Layout => stats.layout_runs += 1,
                },
                Err(err) => {
                    stats.failures += 1;
                    tracing::warn!(
                        layout = %id,
                        target = %target,
                        ?pass,
                        error = %err,
                        "layout pass failed"
                    );
                }
            }
        }
    }

    fn visit_order(&self, tree: &TargetTree) -> Vec<LayoutId> {
        let mut keyed: Vec<(usize, LayoutId)> = self
            .layouts
            .iter()
            .map(|(&id, r)| {
                let depth = r
                    .layout
                    .try_borrow()
                    .ok()
                    .and_then(|l| live_target(&*l, tree))
                    .and_then(|t| tree.depth(t).ok())
                    .unwrap_or(usize::MAX);
                (depth, id)
            })
            .collect();
        keyed.sort_unstable();
        keyed.into_iter().map(|(_, id)| id).collect()
    }

    fn drain_disposed(&mut self) {
        let drained: Vec<LayoutId> = self.disposed.borrow_mut().drain(..).collect();
        for id in drained {
            if self.layouts.remove(&id).is_some() {
                tracing::debug!(layout = %id, "disposed layout removed");
            }
        }
    }
}

fn live_target(layout: &dyn Layout, tree: &TargetTree) -> Option<TargetId> {
    layout.target().filter(|t| tree.contains(*t))
}

#[cfg(test)]
#[path = "../../tests/unit/layout/manager.rs"]
mod tests;
