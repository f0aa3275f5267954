//! Anchor+offset box model: targets, the tree that owns them, and edge offsets.

pub(crate) mod offset;
pub(crate) mod target;
pub(crate) mod tree;
