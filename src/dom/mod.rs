//! DOM module - An in-memory document tree for rendered content
//!
//! Provides:
//! - node: arena document tree with text splitting and tree-order traversal
//! - range: boundary points and live ranges
//! - render: markdown to document (the rendering collaborator)
//! - html: subtree serialization

pub mod html;
pub mod node;
pub mod range;
pub mod render;
