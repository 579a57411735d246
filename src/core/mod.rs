//! Engine internals: catalog, metrics, detection, placement, layout, repair.

pub mod catalog;
pub mod constraints;
pub mod engine;
pub mod layout;
pub mod metrics;
pub mod random;
pub mod repair;
pub mod warnings;

#[cfg(test)]
pub(crate) mod test_support;
