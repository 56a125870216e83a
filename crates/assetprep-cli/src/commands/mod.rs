//! Command handlers grouped by concern.

pub(crate) mod plan;
pub(crate) mod strategies;
