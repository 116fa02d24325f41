//! Shadow DOM
//!
//! A shadow root owns a private tree and its scoped style sheets. Nothing
//! in the host document links into it, so a closed root is only reachable
//! through whoever holds it.

use crate::{DomError, DomTree, NodeId};

/// Shadow root mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowRootMode {
    #[default]
    Open,
    Closed,
}

/// Shadow root
#[derive(Debug)]
pub struct ShadowRoot {
    host: NodeId,
    mode: ShadowRootMode,
    tree: DomTree,
    style_sheets: Vec<String>,
}

impl ShadowRoot {
    /// Create a new shadow root for `host`
    pub fn new(host: NodeId, mode: ShadowRootMode) -> Self {
        Self {
            host,
            mode,
            tree: DomTree::new(),
            style_sheets: Vec::new(),
        }
    }

    /// Host element in the owning document
    pub fn host(&self) -> NodeId {
        self.host
    }

    pub fn mode(&self) -> ShadowRootMode {
        self.mode
    }

    /// The root as seen through `element.shadowRoot`
    pub fn exposed(&self) -> Option<&ShadowRoot> {
        match self.mode {
            ShadowRootMode::Open => Some(self),
            ShadowRootMode::Closed => None,
        }
    }

    /// Private tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Private tree, mutable
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    /// Create an element and append it at the top level of the scope
    pub fn append_element(&mut self, local_name: &str) -> Result<NodeId, DomError> {
        let id = self.tree.create_element(local_name);
        self.tree.append_child(NodeId::ROOT, id)?;
        Ok(id)
    }

    /// Top-level children
    pub fn children(&self) -> Vec<NodeId> {
        self.tree.children(NodeId::ROOT).map(|(id, _)| id).collect()
    }

    /// Add a `<style>` element whose rules apply only inside this scope
    pub fn adopt_style_sheet(&mut self, css: impl Into<String>) -> Result<NodeId, DomError> {
        let css = css.into();
        let style = self.append_element("style")?;
        let text = self.tree.create_text(css.clone());
        self.tree.append_child(style, text)?;
        self.style_sheets.push(css);
        Ok(style)
    }

    /// Scoped style sheets, in adoption order
    pub fn style_sheets(&self) -> &[String] {
        &self.style_sheets
    }
}

/// Element that can host a shadow root
pub trait Shadowable {
    /// Shadow root as visible to outside code (`None` when closed)
    fn shadow_root(&self) -> Option<&ShadowRoot>;
}
