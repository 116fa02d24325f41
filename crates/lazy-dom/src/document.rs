//! Document - High-level document API

use crate::{DomError, DomTree, NodeId};

/// HTML Document
#[derive(Debug)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Document URL
    url: String,
    /// Cached reference to <html> element
    html_element: NodeId,
    /// Cached reference to <body> element
    body_element: NodeId,
}

impl Document {
    /// Create a new document with `<html><head/><body/></html>`
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new();

        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        // Fresh nodes, cannot fail
        let _ = tree.append_child(NodeId::ROOT, html);
        let _ = tree.append_child(html, head);
        let _ = tree.append_child(html, body);

        Self {
            tree,
            url: url.to_string(),
            html_element: html,
            body_element: body,
        }
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// `<html>` element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// `<body>` element
    pub fn body(&self) -> NodeId {
        self.body_element
    }

    /// Create a detached element owned by this document
    pub fn create_element(&mut self, local_name: &str) -> NodeId {
        self.tree.create_element(local_name)
    }

    /// Attribute value of an element
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.tree.element(id).ok()?.get_attr(name)
    }

    /// Set an attribute, returning the previous value
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<Option<String>, DomError> {
        Ok(self.tree.element_mut(id)?.set_attr(name, value))
    }

    /// Remove an attribute, returning the previous value
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<Option<String>, DomError> {
        Ok(self.tree.element_mut(id)?.remove_attr(name))
    }

    /// Whether the element is part of this document's tree
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.tree.is_connected(id)
    }
}
