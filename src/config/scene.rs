use std::{collections::BTreeMap, rc::Rc};

use crate::{
    foundation::{
        core::{Bound3, UNFIXED_SENTINEL, Vec3},
        error::{LayoutError, LayoutResult},
    },
    geometry::{
        offset::OffsetSnapshot,
        target::{TargetGeometry, TargetId},
        tree::TargetTree,
    },
    layout::{
        base::{Layout, LayoutRef, shared},
        manager::{LayoutManager, TickStats},
        offset_fit::OffsetFitLayout,
        size_constraint::SizeConstraintLayout,
        stack::{StackLayout, StackSettings},
    },
};

/// Declarative description of a target tree and the layouts bound to it.
///
/// Vectors are `[x, y, z]` arrays. Nodes must be listed parent first.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    /// Targets, parents before children.
    pub nodes: Vec<NodeConfig>,
    /// Layouts, each naming the node it binds to.
    pub layouts: Vec<LayoutConfig>,
}

/// One target of a [`SceneConfig`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfig {
    /// Unique node name.
    pub name: String,
    /// Name of an earlier node, or `None` for a root.
    pub parent: Option<String>,
    /// Lower anchor.
    pub anchor_min: [f64; 3],
    /// Upper anchor.
    pub anchor_max: [f64; 3],
    /// Initial size.
    pub size: [f64; 3],
    /// Initial center offset from the anchor area.
    pub offset: [f64; 3],
    /// Sizing policy.
    pub info: LayoutInfoConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            parent: None,
            anchor_min: [0.5; 3],
            anchor_max: [0.5; 3],
            size: [0.0; 3],
            offset: [0.0; 3],
            info: LayoutInfoConfig::default(),
        }
    }
}

/// Sizing policy in its persisted form: a negative component means the axis is unfixed.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutInfoConfig {
    /// Per-axis ceiling.
    pub layout_size: [f64; 3],
    /// Per-axis floor.
    pub min_size: [f64; 3],
    /// Per-axis upper bound for group growth.
    pub max_size: [f64; 3],
    /// Skip this node in its parent's group.
    pub ignore_layout_group: bool,
    /// Share of leftover group space.
    pub size_grow_in_group: f64,
    /// Sort key among siblings.
    pub order_in_group: i32,
}

impl Default for LayoutInfoConfig {
    fn default() -> Self {
        Self {
            layout_size: [UNFIXED_SENTINEL; 3],
            min_size: [UNFIXED_SENTINEL; 3],
            max_size: [UNFIXED_SENTINEL; 3],
            ignore_layout_group: false,
            size_grow_in_group: 0.0,
            order_in_group: 0,
        }
    }
}

/// A layout bound to a named node.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutConfig {
    /// [`SizeConstraintLayout`].
    SizeConstraint {
        /// Node name.
        target: String,
        /// Precedence hint.
        #[serde(default)]
        priority: i32,
    },
    /// [`OffsetFitLayout`].
    OffsetFit {
        /// Node name.
        target: String,
        /// Precedence hint.
        #[serde(default)]
        priority: i32,
        /// Insets from the parent's edges.
        #[serde(default)]
        offset: OffsetSnapshot,
    },
    /// [`StackLayout`].
    Stack {
        /// Node name.
        target: String,
        /// Precedence hint.
        #[serde(default)]
        priority: i32,
        /// Stack tunables.
        #[serde(default)]
        settings: StackSettings,
        /// Inner padding.
        #[serde(default)]
        padding: OffsetSnapshot,
    },
}

impl LayoutConfig {
    /// Name of the node this layout binds to.
    pub fn target(&self) -> &str {
        match self {
            LayoutConfig::SizeConstraint { target, .. }
            | LayoutConfig::OffsetFit { target, .. }
            | LayoutConfig::Stack { target, .. } => target,
        }
    }

    /// Precedence hint.
    pub fn priority(&self) -> i32 {
        match self {
            LayoutConfig::SizeConstraint { priority, .. }
            | LayoutConfig::OffsetFit { priority, .. }
            | LayoutConfig::Stack { priority, .. } => *priority,
        }
    }
}

/// Resolved geometry per node name, in name order.
pub type SceneSnapshot = BTreeMap<String, TargetGeometry>;

impl SceneConfig {
    /// Parse a scene from JSON.
    pub fn from_json_str(json: &str) -> LayoutResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the scene to pretty JSON.
    pub fn to_json_string(&self) -> LayoutResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Instantiate the tree, construct every layout and register it with a fresh manager.
    #[tracing::instrument(skip(self), fields(nodes = self.nodes.len(), layouts = self.layouts.len()))]
    pub fn build(&self) -> LayoutResult<Scene> {
        let mut tree = TargetTree::new();
        let mut names = BTreeMap::new();

        for node in &self.nodes {
            if node.name.is_empty() {
                return Err(LayoutError::config("node name must be non-empty"));
            }
            if names.contains_key(&node.name) {
                return Err(LayoutError::config(format!(
                    "duplicate node name `{}`",
                    node.name
                )));
            }
            let parent = match &node.parent {
                None => None,
                Some(p) => Some(self.resolve_parent(&names, &node.name, p)?),
            };
            let id = tree.insert_with(
                parent,
                TargetGeometry {
                    local_pos: Vec3::ZERO,
                    local_size: node.size.into(),
                    anchor_min: node.anchor_min.into(),
                    anchor_max: node.anchor_max.into(),
                    offset: node.offset.into(),
                },
            )?;
            apply_info(&mut tree, id, &node.info)?;
            names.insert(node.name.clone(), id);
        }

        let mut manager = LayoutManager::new();
        let mut layouts = Vec::with_capacity(self.layouts.len());
        for cfg in &self.layouts {
            let target = *names.get(cfg.target()).ok_or_else(|| {
                LayoutError::config(format!("layout targets unknown node `{}`", cfg.target()))
            })?;
            let layout: LayoutRef = match cfg {
                LayoutConfig::SizeConstraint { .. } => {
                    prioritized(SizeConstraintLayout::new(&mut tree, target)?, cfg.priority())
                }
                LayoutConfig::OffsetFit { offset, .. } => prioritized(
                    OffsetFitLayout::new(&mut tree, target, *offset)?,
                    cfg.priority(),
                ),
                LayoutConfig::Stack {
                    settings, padding, ..
                } => prioritized(
                    StackLayout::new(&mut tree, target, *settings, *padding)?,
                    cfg.priority(),
                ),
            };
            manager.entry(Rc::clone(&layout));
            layouts.push(layout);
        }

        Ok(Scene {
            tree,
            manager,
            layouts,
            names,
        })
    }

    fn resolve_parent(
        &self,
        names: &BTreeMap<String, TargetId>,
        child: &str,
        parent: &str,
    ) -> LayoutResult<TargetId> {
        if let Some(&id) = names.get(parent) {
            return Ok(id);
        }
        if self.nodes.iter().any(|n| n.name == parent) {
            return Err(LayoutError::config(format!(
                "parent `{parent}` of `{child}` must be declared before it"
            )));
        }
        Err(LayoutError::config(format!(
            "node `{child}` has unknown parent `{parent}`"
        )))
    }
}

fn apply_info(tree: &mut TargetTree, id: TargetId, cfg: &LayoutInfoConfig) -> LayoutResult<()> {
    let info = tree.info_mut(id)?;
    info.set_layout_size(Bound3::from_sentinel(cfg.layout_size.into()));
    info.set_min_max_size(
        Bound3::from_sentinel(cfg.min_size.into()),
        Bound3::from_sentinel(cfg.max_size.into()),
    );
    info.set_ignore_layout_group(cfg.ignore_layout_group);
    info.set_size_grow_in_group(cfg.size_grow_in_group);
    info.set_order_in_group(cfg.order_in_group);
    Ok(())
}

fn prioritized<L: Layout + 'static>(mut layout: L, priority: i32) -> LayoutRef {
    layout.core_mut().set_priority(priority);
    shared(layout)
}

/// A built scene: the tree, its layouts and the manager that ticks them.
#[derive(Debug)]
pub struct Scene {
    /// Target arena.
    pub tree: TargetTree,
    /// Tick driver with every configured layout registered.
    pub manager: LayoutManager,
    /// Handles to the configured layouts, in configuration order.
    pub layouts: Vec<LayoutRef>,
    names: BTreeMap<String, TargetId>,
}

impl Scene {
    /// Id of the node called `name`.
    pub fn target(&self, name: &str) -> Option<TargetId> {
        self.names.get(name).copied()
    }

    /// Node names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.keys().map(String::as_str)
    }

    /// Run one layout tick.
    pub fn tick(&mut self) -> TickStats {
        self.manager.calculate_layouts(&mut self.tree)
    }

    /// Current geometry of every live named node.
    pub fn snapshot(&self) -> SceneSnapshot {
        self.names
            .iter()
            .filter_map(|(name, &id)| Some((name.clone(), self.tree.get(id).ok()?.geometry())))
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/scene.rs"]
mod tests;
