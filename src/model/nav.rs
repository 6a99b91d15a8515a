//! The navigation tree.
//!
//! Source readers produce owned [`TocEntry`] trees. The TOC builder loads them
//! into a [`NavTree`], an arena of [`NavNode`]s addressed by [`NavId`], which
//! the reconciler grows in place and the linearizer flattens.

use super::href;

/// Index of a node in a [`NavTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NavId(pub u32);

impl NavId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Which source a navigation node came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The book's curated table of contents (NCX).
    CuratedToc,
    /// The EPUB 3 navigation document.
    NavDocument,
    /// Synthesized from the spine.
    SpineSynthesized,
    /// Merged in from the package guide.
    Guide,
}

/// A table of contents entry as returned by a source reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub title: String,
    /// Href relative to the package directory, fragment allowed.
    pub href: String,
    pub children: Vec<TocEntry>,
}

impl TocEntry {
    pub fn new(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            href: href.into(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: TocEntry) -> Self {
        self.children.push(child);
        self
    }
}

/// A node in the navigation tree.
#[derive(Debug, Clone)]
pub struct NavNode {
    pub title: String,
    /// Raw href relative to the package directory, fragment allowed.
    pub href: String,
    pub origin: Origin,
    parent: Option<NavId>,
    children: Vec<NavId>,
}

impl NavNode {
    /// HtmlPath: fragment stripped, percent-decoded.
    pub fn html_path(&self) -> String {
        href::html_path(&self.href)
    }

    pub fn parent(&self) -> Option<NavId> {
        self.parent
    }

    pub fn children(&self) -> &[NavId] {
        &self.children
    }
}

/// Arena-backed navigation tree with ordered top-level nodes.
#[derive(Debug, Clone, Default)]
pub struct NavTree {
    nodes: Vec<NavNode>,
    roots: Vec<NavId>,
}

impl NavTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from reader output, tagging every node with `origin`.
    pub fn from_entries(entries: Vec<TocEntry>, origin: Origin) -> Self {
        let mut tree = Self::new();
        for entry in entries {
            tree.append_entry(None, entry, origin);
        }
        tree
    }

    fn append_entry(&mut self, parent: Option<NavId>, entry: TocEntry, origin: Origin) {
        let id = match parent {
            Some(parent) => self.push_child(parent, entry.title, entry.href, origin),
            None => self.push_root(entry.title, entry.href, origin),
        };
        for child in entry.children {
            self.append_entry(Some(id), child, origin);
        }
    }

    fn alloc(&mut self, title: String, href: String, origin: Origin, parent: Option<NavId>) -> NavId {
        let id = NavId(self.nodes.len() as u32);
        self.nodes.push(NavNode {
            title,
            href,
            origin,
            parent,
            children: Vec::new(),
        });
        id
    }

    /// Append a top-level node after the existing ones.
    pub fn push_root(&mut self, title: impl Into<String>, href: impl Into<String>, origin: Origin) -> NavId {
        let id = self.alloc(title.into(), href.into(), origin, None);
        self.roots.push(id);
        id
    }

    /// Insert a top-level node at `index` (0 = first).
    pub fn insert_root(
        &mut self,
        index: usize,
        title: impl Into<String>,
        href: impl Into<String>,
        origin: Origin,
    ) -> NavId {
        let id = self.alloc(title.into(), href.into(), origin, None);
        self.roots.insert(index.min(self.roots.len()), id);
        id
    }

    /// Append a node as the last child of `parent`.
    pub fn push_child(
        &mut self,
        parent: NavId,
        title: impl Into<String>,
        href: impl Into<String>,
        origin: Origin,
    ) -> NavId {
        let id = self.alloc(title.into(), href.into(), origin, Some(parent));
        self.nodes[parent.index()].children.push(id);
        id
    }

    pub fn get(&self, id: NavId) -> Option<&NavNode> {
        self.nodes.get(id.index())
    }

    /// Node by id. Ids handed out by this tree are always valid.
    pub fn node(&self, id: NavId) -> &NavNode {
        &self.nodes[id.index()]
    }

    pub fn roots(&self) -> &[NavId] {
        &self.roots
    }

    pub fn children(&self, id: NavId) -> &[NavId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Total number of nodes at every depth.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node ids in pre-order (parent first, siblings left to right).
    pub fn preorder(&self) -> Vec<NavId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NavId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Hrefs of the top-level nodes, in order. Mostly useful in tests.
    pub fn root_hrefs(&self) -> Vec<&str> {
        self.roots.iter().map(|&id| self.node(id).href.as_str()).collect()
    }

    /// Hrefs of the children of `id`, in order.
    pub fn child_hrefs(&self, id: NavId) -> Vec<&str> {
        self.children(id)
            .iter()
            .map(|&c| self.node(c).href.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_entries_keeps_hierarchy() {
        let entries = vec![
            TocEntry::new("Part I", "part1.xhtml")
                .with_child(TocEntry::new("Chapter 1", "ch1.xhtml"))
                .with_child(TocEntry::new("Chapter 2", "ch2.xhtml")),
            TocEntry::new("Part II", "part2.xhtml"),
        ];
        let tree = NavTree::from_entries(entries, Origin::CuratedToc);

        assert_eq!(tree.len(), 4);
        assert_eq!(tree.root_hrefs(), vec!["part1.xhtml", "part2.xhtml"]);
        let part1 = tree.roots()[0];
        assert_eq!(tree.child_hrefs(part1), vec!["ch1.xhtml", "ch2.xhtml"]);
        let ch1 = tree.children(part1)[0];
        assert_eq!(tree.node(ch1).parent(), Some(part1));
        assert_eq!(tree.node(ch1).origin, Origin::CuratedToc);
    }

    #[test]
    fn test_insert_root_and_preorder() {
        let mut tree = NavTree::new();
        let b = tree.push_root("B", "b.xhtml", Origin::CuratedToc);
        tree.push_child(b, "B1", "b1.xhtml", Origin::CuratedToc);
        tree.insert_root(0, "A", "a.xhtml", Origin::Guide);
        tree.push_root("C", "c.xhtml", Origin::CuratedToc);

        let order: Vec<_> = tree
            .preorder()
            .into_iter()
            .map(|id| tree.node(id).href.clone())
            .collect();
        assert_eq!(order, vec!["a.xhtml", "b.xhtml", "b1.xhtml", "c.xhtml"]);
    }

    #[test]
    fn test_html_path_drops_fragment_and_decodes() {
        let mut tree = NavTree::new();
        let first = tree.push_root("One", "Text/ch%201.xhtml#top", Origin::CuratedToc);
        let second = tree.push_root("Two", "Text/ch%201.xhtml#mid", Origin::CuratedToc);

        assert_eq!(tree.node(first).html_path(), "Text/ch 1.xhtml");
        assert_eq!(tree.node(first).html_path(), tree.node(second).html_path());
    }
}
