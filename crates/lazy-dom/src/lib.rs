//! Lazy DOM - Document Object Model
//!
//! Arena-based DOM tree with the pieces a lazily loading element needs:
//! inline styles, closed shadow scopes, intersection observers and a
//! custom element registry.

mod node;
mod tree;
mod style;
mod document;
mod geometry;
mod shadow;
mod observer;
mod custom_elements;

pub use node::{Node, NodeData, ElementData, Attribute};
pub use tree::DomTree;
pub use style::InlineStyle;
pub use document::Document;
pub use geometry::DOMRect;
pub use shadow::{ShadowRoot, ShadowRootMode, Shadowable};
pub use observer::{
    IntersectionObserver, IntersectionObserverEntry, IntersectionObserverHandle,
    IntersectionObserverInit, ObserverId, RootMargin,
};
pub use custom_elements::{CustomElementDefinition, CustomElementError, CustomElementRegistry};

use std::fmt;

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root node ID
    pub const ROOT: NodeId = NodeId(0);
    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check this is not the sentinel
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.0)
        } else {
            f.write_str("#none")
        }
    }
}

/// DOM error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomError {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("Cannot insert {child} under {parent}: would create a cycle")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    #[error("Invalid root margin: {0:?}")]
    InvalidRootMargin(String),

    #[error("Threshold {0} outside [0, 1]")]
    InvalidThreshold(f64),
}
