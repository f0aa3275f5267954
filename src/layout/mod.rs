//! Sizing policy, the layout strategy contract, concrete strategies and the tick driver.

pub(crate) mod base;
pub(crate) mod info;
pub(crate) mod manager;
pub(crate) mod offset_fit;
pub(crate) mod size_constraint;
pub(crate) mod stack;
