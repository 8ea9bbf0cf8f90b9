//! Arena-backed document tree
//!
//! Nodes are addressed by `NodeId` and never freed; detached nodes simply lose
//! their parent link. Text offsets are counted in chars.

use crate::error::DomError;

/// Handle to a node inside a `Document`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Element payload: tag name plus ordered attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A rendered document: an arena of nodes rooted at a single element
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document whose root is `<div id="content">`
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        let root = doc.create_element("div");
        doc.set_attr(root, "id", "content");
        doc.root = root;
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(ElementData {
            tag: tag.to_string(),
            attrs: Vec::new(),
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.node(id).data
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.node(id).data, NodeData::Text(_))
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Text(t) => Some(t),
            NodeData::Element(_) => None,
        }
    }

    /// Length in chars of a text node, or child count of an element
    pub fn node_len(&self, id: NodeId) -> usize {
        match &self.node(id).data {
            NodeData::Text(t) => t.chars().count(),
            NodeData::Element(_) => self.node(id).children.len(),
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Element(e) => Some(&e.tag),
            NodeData::Text(_) => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Element(e) => e
                .attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            NodeData::Text(_) => None,
        }
    }

    /// Set an attribute; ignored on text nodes
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeData::Element(e) = &mut self.node_mut(id).data {
            match e.attrs.iter_mut().find(|(k, _)| k == name) {
                Some(slot) => slot.1 = value.to_string(),
                None => e.attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    /// Position of `id` among its parent's children
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Remove `id` from its parent (if any)
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|c| *c != id);
            self.node_mut(id).parent = None;
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.node_mut(parent).children.push(child);
        self.node_mut(child).parent = Some(parent);
    }

    /// Insert `child` into `parent` right before `reference`
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> Result<(), DomError> {
        self.detach(child);
        let index = self
            .children(parent)
            .iter()
            .position(|c| *c == reference)
            .ok_or(DomError::Detached(reference))?;
        self.node_mut(parent).children.insert(index, child);
        self.node_mut(child).parent = Some(parent);
        Ok(())
    }

    /// Split a text node at `offset`; the original keeps the head and the
    /// returned node (inserted right after it) holds the tail.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Result<NodeId, DomError> {
        let text = self.text(id).ok_or(DomError::NotText(id))?.to_string();
        let len = text.chars().count();
        if offset > len {
            return Err(DomError::OffsetOutOfBounds {
                node: id,
                offset,
                len,
            });
        }

        let byte = char_to_byte(&text, offset);
        let tail = self.create_text(&text[byte..]);
        self.node_mut(id).data = NodeData::Text(text[..byte].to_string());

        if let Some(parent) = self.parent(id) {
            let index = self.index_in_parent(id).ok_or(DomError::Detached(id))?;
            self.node_mut(parent).children.insert(index + 1, tail);
            self.node_mut(tail).parent = Some(parent);
        }

        Ok(tail)
    }

    /// Merge adjacent text children and drop empty ones, recursively
    pub fn normalize(&mut self, id: NodeId) {
        let children = self.children(id).to_vec();
        let mut kept: Vec<NodeId> = Vec::with_capacity(children.len());

        for child in children {
            if let Some(text) = self.text(child).map(str::to_string) {
                if text.is_empty() {
                    self.node_mut(child).parent = None;
                    continue;
                }
                if let Some(prev) = kept.last().copied() {
                    if let NodeData::Text(prev_text) = &mut self.node_mut(prev).data {
                        prev_text.push_str(&text);
                        self.node_mut(child).parent = None;
                        continue;
                    }
                }
                kept.push(child);
            } else {
                self.normalize(child);
                kept.push(child);
            }
        }

        self.node_mut(id).children = kept;
    }

    /// All descendants of `id` (excluding `id`) in document order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Text-node descendants of `id` in document order
    pub fn text_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|n| self.is_text(*n))
            .collect()
    }

    /// Concatenated text of `id` and its descendants
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.text_nodes(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// Inclusive ancestor chain, from `id` up to its top-most ancestor
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).contains(&ancestor)
    }

    /// Child indexes leading from the top-most ancestor down to `id`
    pub fn tree_path(&self, id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(index) = self.index_in_parent(current) {
            path.push(index);
            match self.parent(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        path.reverse();
        path
    }

    /// Elements below `id` whose attribute `name` equals `value`, in document order
    pub fn find_by_attr(&self, id: NodeId, name: &str, value: &str) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|n| self.attr(*n, name) == Some(value))
            .collect()
    }

    /// Elements below `id` carrying attribute `name`, in document order
    pub fn find_with_attr(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|n| self.attr(*n, name).is_some())
            .collect()
    }
}

/// Byte index of the `offset`-th char of `s` (or `s.len()` past the end)
pub fn char_to_byte(s: &str, offset: usize) -> usize {
    s.char_indices()
        .nth(offset)
        .map(|(byte, _)| byte)
        .unwrap_or(s.len())
}
