//! DOM Tree (arena-based allocation)

use crate::{DomError, ElementData, Node, NodeId};

/// Arena-based DOM tree. Slot 0 always holds the root node.
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a tree holding only its root
    pub fn new() -> Self {
        Self { nodes: vec![Node::document()] }
    }

    /// Root node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, local_name: &str) -> NodeId {
        self.push(Node::element(local_name))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.push(Node::text(content.into()))
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    fn node(&self, id: NodeId) -> Result<&Node, DomError> {
        self.get(id).ok_or(DomError::UnknownNode(id))
    }

    /// Element data of `id`
    pub fn element(&self, id: NodeId) -> Result<&ElementData, DomError> {
        self.node(id)?.as_element().ok_or(DomError::NotAnElement(id))
    }

    /// Mutable element data of `id`
    pub fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
        self.get_mut(id)
            .ok_or(DomError::UnknownNode(id))?
            .as_element_mut()
            .ok_or(DomError::NotAnElement(id))
    }

    /// Parent of `id`, if attached
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(|p| p.is_valid())
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = node;
        while current.is_valid() {
            if current == ancestor {
                return true;
            }
            current = match self.get(current) {
                Some(n) => n.parent,
                None => return false,
            };
        }
        false
    }

    /// Whether `id` is reachable from the root
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.get(id).is_some() && self.is_inclusive_ancestor(NodeId::ROOT, id)
    }

    /// Append `child` as the last child of `parent`, moving it if attached elsewhere
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.node(parent)?;
        self.node(child)?;
        if child == NodeId::ROOT || self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }

        self.detach(child)?;

        let last = self.nodes[parent.index()].last_child;
        {
            let node = &mut self.nodes[child.index()];
            node.parent = parent;
            node.prev_sibling = last;
            node.next_sibling = NodeId::NONE;
        }
        if last.is_valid() {
            self.nodes[last.index()].next_sibling = child;
        } else {
            self.nodes[parent.index()].first_child = child;
        }
        self.nodes[parent.index()].last_child = child;
        Ok(())
    }

    /// Unlink `child` from its parent. No-op for detached nodes.
    pub fn detach(&mut self, child: NodeId) -> Result<(), DomError> {
        let (parent, prev, next) = {
            let n = self.node(child)?;
            (n.parent, n.prev_sibling, n.next_sibling)
        };
        if !parent.is_valid() {
            return Ok(());
        }

        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else {
            self.nodes[parent.index()].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        } else {
            self.nodes[parent.index()].last_child = prev;
        }

        let node = &mut self.nodes[child.index()];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
        Ok(())
    }

    /// Iterate direct children
    pub fn children(&self, id: NodeId) -> Children<'_> {
        let next = self.get(id).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        Children { tree: self, next }
    }

    /// `id` and all its descendants in tree order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.get(id).is_none() {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            let children: Vec<NodeId> = self.children(current).map(|(c, _)| c).collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Number of nodes in the arena
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree holds nothing but its root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }
}

/// Child iterator
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        if !self.next.is_valid() {
            return None;
        }
        let id = self.next;
        let node = self.tree.get(id)?;
        self.next = node.next_sibling;
        Some((id, node))
    }
}
