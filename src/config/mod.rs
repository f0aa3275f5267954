//! JSON scene descriptions.

pub(crate) mod scene;
