//! Reconciliation of stored documents with freshly computed defaults.
//!
//! The merge works on raw [`serde_json::Value`] trees rather than typed
//! records, so an absent key and a key holding a bad value are handled
//! separately: absent keys are filled, bad values are replaced, and every
//! valid user value survives.

mod deep;
mod path;
mod reconcile;

pub use deep::deep_merge;
pub use path::{get_nested, nested_overlay};
pub use reconcile::{Reconciled, merge, reconcile, salvageable};

#[cfg(test)]
mod tests;
