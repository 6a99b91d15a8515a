//! Arena-based DOM for content pages.
//!
//! html5ever parses into this tree through [`super::tree_sink::PageSink`].
//! Nodes live in one vector and link to each other by index, so the page can be
//! walked and its `img`/`a`/`link` attributes rewritten in place.

use html5ever::{LocalName, QualName};

/// Unique identifier for a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DomId(pub u32);

impl DomId {
    /// Sentinel value for no node.
    pub const NONE: DomId = DomId(u32::MAX);

    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

/// Node payload.
#[derive(Debug, Clone)]
pub enum DomData {
    Document,
    Element { name: QualName, attrs: Vec<Attribute> },
    Text(String),
    Comment(String),
    Doctype { name: String },
}

/// HTML attribute.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

/// A node in the arena.
#[derive(Debug)]
pub struct DomNode {
    pub data: DomData,
    pub parent: DomId,
    pub first_child: DomId,
    pub last_child: DomId,
    pub prev_sibling: DomId,
    pub next_sibling: DomId,
}

impl DomNode {
    fn new(data: DomData) -> Self {
        Self {
            data,
            parent: DomId::NONE,
            first_child: DomId::NONE,
            last_child: DomId::NONE,
            prev_sibling: DomId::NONE,
            next_sibling: DomId::NONE,
        }
    }
}

/// Arena-backed document tree.
pub struct PageDom {
    nodes: Vec<DomNode>,
    document: DomId,
}

impl PageDom {
    /// Create a new empty DOM with a document root.
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            document: DomId::NONE,
        };
        dom.document = dom.alloc(DomNode::new(DomData::Document));
        dom
    }

    fn alloc(&mut self, node: DomNode) -> DomId {
        let id = DomId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn document(&self) -> DomId {
        self.document
    }

    pub fn get(&self, id: DomId) -> Option<&DomNode> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: DomId) -> Option<&mut DomNode> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> DomId {
        self.alloc(DomNode::new(DomData::Element { name, attrs }))
    }

    pub fn create_text(&mut self, text: String) -> DomId {
        self.alloc(DomNode::new(DomData::Text(text)))
    }

    pub fn create_comment(&mut self, text: String) -> DomId {
        self.alloc(DomNode::new(DomData::Comment(text)))
    }

    pub fn create_doctype(&mut self, name: String) -> DomId {
        self.alloc(DomNode::new(DomData::Doctype { name }))
    }

    /// Append a child to a parent node.
    pub fn append(&mut self, parent: DomId, child: DomId) {
        let last_child = self.get(parent).map(|n| n.last_child).unwrap_or(DomId::NONE);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = parent;
            child_node.prev_sibling = last_child;
            child_node.next_sibling = DomId::NONE;
        }

        if last_child.is_some()
            && let Some(last_node) = self.get_mut(last_child)
        {
            last_node.next_sibling = child;
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    /// Insert a node before a sibling, moving it out of its current place
    /// first.
    pub fn insert_before(&mut self, sibling: DomId, new_node: DomId) {
        if self.parent(new_node).is_some() {
            self.detach(new_node);
        }
        let (parent, prev) = match self.get(sibling) {
            Some(n) => (n.parent, n.prev_sibling),
            None => return,
        };

        if let Some(new) = self.get_mut(new_node) {
            new.parent = parent;
            new.prev_sibling = prev;
            new.next_sibling = sibling;
        }

        if let Some(sib) = self.get_mut(sibling) {
            sib.prev_sibling = new_node;
        }

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = new_node;
            }
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = new_node;
        }
    }

    /// Unlink a node from its parent and siblings.
    pub fn detach(&mut self, target: DomId) {
        let (parent, prev, next) = match self.get(target) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return,
        };

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = next;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.first_child = next;
        }

        if next.is_some() {
            if let Some(n) = self.get_mut(next) {
                n.prev_sibling = prev;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.last_child = prev;
        }

        if let Some(node) = self.get_mut(target) {
            node.parent = DomId::NONE;
            node.prev_sibling = DomId::NONE;
            node.next_sibling = DomId::NONE;
        }
    }

    /// Append text to an existing text node, or create new if last child isn't text.
    pub fn append_text(&mut self, parent: DomId, text: &str) {
        let last_child = self.get(parent).map(|n| n.last_child).unwrap_or(DomId::NONE);

        if let Some(last) = self.get_mut(last_child)
            && let DomData::Text(ref mut existing) = last.data
        {
            existing.push_str(text);
            return;
        }

        let text_node = self.create_text(text.to_string());
        self.append(parent, text_node);
    }

    /// Insert text before `sibling`, extending a text node that already
    /// precedes it.
    pub fn insert_text_before(&mut self, sibling: DomId, text: &str) {
        let prev = self.get(sibling).map(|n| n.prev_sibling).unwrap_or(DomId::NONE);

        if let Some(prev) = self.get_mut(prev)
            && let DomData::Text(ref mut existing) = prev.data
        {
            existing.push_str(text);
            return;
        }

        let text_node = self.create_text(text.to_string());
        self.insert_before(sibling, text_node);
    }

    /// Add the attributes an element does not carry yet. Existing values win.
    pub fn add_missing_attrs(&mut self, id: DomId, new_attrs: impl IntoIterator<Item = Attribute>) {
        if let Some(node) = self.get_mut(id)
            && let DomData::Element { attrs, .. } = &mut node.data
        {
            for attr in new_attrs {
                if !attrs.iter().any(|a| a.name == attr.name) {
                    attrs.push(attr);
                }
            }
        }
    }

    /// Move every child of `from` to the end of `to`, keeping their order.
    pub fn reparent_children(&mut self, from: DomId, to: DomId) {
        let children: Vec<_> = self.children(from).collect();
        for child in children {
            self.detach(child);
            self.append(to, child);
        }
    }

    pub fn parent(&self, id: DomId) -> Option<DomId> {
        self.get(id).map(|n| n.parent).filter(DomId::is_some)
    }

    /// Full element name, namespace included.
    pub fn qual_name(&self, id: DomId) -> Option<&QualName> {
        self.get(id).and_then(|n| match &n.data {
            DomData::Element { name, .. } => Some(name),
            _ => None,
        })
    }

    /// Iterate over children of a node.
    pub fn children(&self, parent: DomId) -> ChildrenIter<'_> {
        let first = self.get(parent).map(|n| n.first_child).unwrap_or(DomId::NONE);
        ChildrenIter {
            dom: self,
            current: first,
        }
    }

    /// All descendants of `root` in document order, `root` excluded.
    pub fn descendants(&self, root: DomId) -> Vec<DomId> {
        let mut out = Vec::new();
        let mut stack: Vec<DomId> = self.children(root).collect();
        stack.reverse();
        while let Some(id) = stack.pop() {
            out.push(id);
            let mut children: Vec<_> = self.children(id).collect();
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Elements under `root` (document order) whose tag is one of `tags`.
    pub fn elements_by_tag(&self, root: DomId, tags: &[&str]) -> Vec<DomId> {
        self.descendants(root)
            .into_iter()
            .filter(|&id| self.element_name(id).is_some_and(|n| tags.contains(&n.as_ref())))
            .collect()
    }

    /// First element with the given tag, in document order.
    pub fn find_by_tag(&self, tag: &str) -> Option<DomId> {
        self.descendants(self.document)
            .into_iter()
            .find(|&id| self.element_name(id).is_some_and(|n| n.as_ref() == tag))
    }

    /// Element's local name (tag).
    pub fn element_name(&self, id: DomId) -> Option<&LocalName> {
        self.get(id).and_then(|n| match &n.data {
            DomData::Element { name, .. } => Some(&name.local),
            _ => None,
        })
    }

    /// Get an attribute value.
    pub fn get_attr(&self, id: DomId, attr_name: &str) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            DomData::Element { attrs, .. } => attrs
                .iter()
                .find(|a| a.name.local.as_ref() == attr_name)
                .map(|a| a.value.as_str()),
            _ => None,
        })
    }

    /// Replace the value of an existing attribute. Returns false when the
    /// element has no such attribute.
    pub fn set_attr(&mut self, id: DomId, attr_name: &str, value: String) -> bool {
        if let Some(node) = self.get_mut(id)
            && let DomData::Element { attrs, .. } = &mut node.data
            && let Some(attr) = attrs.iter_mut().find(|a| a.name.local.as_ref() == attr_name)
        {
            attr.value = value;
            return true;
        }
        false
    }

    /// Get text content of a text node.
    pub fn text_content(&self, id: DomId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            DomData::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }
}

impl Default for PageDom {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over children of a node.
pub struct ChildrenIter<'a> {
    dom: &'a PageDom,
    current: DomId,
}

impl<'a> Iterator for ChildrenIter<'a> {
    type Item = DomId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self.dom.get(id).map(|n| n.next_sibling).unwrap_or(DomId::NONE);
        Some(id)
    }
}
