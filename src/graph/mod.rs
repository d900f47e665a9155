//! Resolved instance graphs: classification, traversal, and validation.
//!
//! Resolving a build-plan produces an [`InstanceNode`] tree. Every
//! object-typed slot of a plan becomes a [`ChildProperty`] whose
//! [`ChildKind`] was decided exactly once at construction time; validation
//! and traversal dispatch on that kind. Inline subtrees are finite and
//! exclusively owned, and reference edges are never followed during a walk,
//! so traversal terminates without cycle bookkeeping even when the
//! configuration is self-referential in key space.

mod node;
mod property;
mod tree_render;
mod visit;

pub use node::*;
pub use property::*;
pub use tree_render::render_tree;
pub use visit::*;
