//! Module registry and the transforms it dispatches to.

pub mod effects;
pub mod node_types;

pub use node_types::ModuleKind;
