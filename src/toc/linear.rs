//! Flatten the navigation tree into one reading sequence.
//!
//! Nodes are visited in pre-order across the whole tree, so the `next` of a
//! chapter's last leaf is the following chapter: pagination never stops at a
//! top-level boundary.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::href::{base_name, dir_name, html_path};
use crate::model::{NavId, NavTree};

/// A navigation node placed in the global reading sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearNode {
    /// The node in the source [`NavTree`].
    pub id: NavId,
    pub title: String,
    /// Raw href, fragment included.
    pub href: String,
    /// 1 for top-level nodes.
    pub depth: usize,
    /// Dot-separated 1-based sibling positions (`"2.1.3"`).
    pub level: String,
    pub prev: Option<usize>,
    pub next: Option<usize>,
    /// Fragment stripped, percent-decoded.
    pub html_path: String,
    /// Basename of `html_path`: the physical page.
    pub src: String,
    /// Directory portion of the raw href (`.` when there is none).
    pub dir: String,
    /// Basename of the raw href, fragment included.
    pub src_raw: String,
    body: Option<String>,
}

impl LinearNode {
    /// Rendered body, present between rendering and indexing.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

/// The flattened tree: a doubly linked list in pre-order, stored by position.
#[derive(Debug, Clone, Default)]
pub struct LinearNav {
    nodes: Vec<LinearNode>,
    by_id: HashMap<NavId, usize>,
}

impl LinearNav {
    /// Flatten `tree`.
    ///
    /// An empty tree or a node without an href is malformed; nothing is
    /// returned in that case.
    pub fn build(tree: &NavTree) -> Result<Self> {
        if tree.roots().is_empty() {
            return Err(Error::malformed("navigation tree", "no pages to render"));
        }

        let mut linear = LinearNav {
            nodes: Vec::with_capacity(tree.len()),
            by_id: HashMap::with_capacity(tree.len()),
        };

        let mut prev = None;
        for (position, &root) in tree.roots().iter().enumerate() {
            let level = (position + 1).to_string();
            prev = Some(linear.visit(tree, root, 1, level, prev)?);
        }

        debug!(nodes = linear.nodes.len(), "linearized navigation tree");
        Ok(linear)
    }

    /// Place `id` after `prev`, then its subtree. Returns the index of the
    /// last node placed.
    fn visit(
        &mut self,
        tree: &NavTree,
        id: NavId,
        depth: usize,
        level: String,
        prev: Option<usize>,
    ) -> Result<usize> {
        let node = tree
            .get(id)
            .ok_or_else(|| Error::malformed("navigation tree", format!("dangling node {}", id.0)))?;
        if node.href.trim().is_empty() {
            return Err(Error::malformed(
                "navigation tree",
                format!("entry {:?} has no href", node.title),
            ));
        }

        let index = self.nodes.len();
        let html_path = html_path(&node.href);
        self.nodes.push(LinearNode {
            id,
            title: node.title.clone(),
            href: node.href.clone(),
            depth,
            level: level.clone(),
            prev,
            next: None,
            src: base_name(&html_path).to_string(),
            html_path,
            dir: dir_name(&node.href).to_string(),
            src_raw: base_name(&node.href).to_string(),
            body: None,
        });
        self.by_id.insert(id, index);
        if let Some(prev) = prev {
            self.nodes[prev].next = Some(index);
        }

        let mut last = index;
        for (position, &child) in node.children().iter().enumerate() {
            let child_level = format!("{level}.{}", position + 1);
            last = self.visit(tree, child, depth + 1, child_level, Some(last))?;
        }
        Ok(last)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LinearNode> {
        self.nodes.get(index)
    }

    pub fn nodes(&self) -> &[LinearNode] {
        &self.nodes
    }

    /// Position of a tree node in the sequence.
    pub fn index_of(&self, id: NavId) -> Option<usize> {
        self.by_id.get(&id).copied()
    }

    /// First node of the sequence.
    pub fn head(&self) -> Option<usize> {
        if self.nodes.is_empty() { None } else { Some(0) }
    }

    /// Last node of the sequence.
    pub fn tail(&self) -> Option<usize> {
        self.nodes.len().checked_sub(1)
    }

    /// The next node that is a different physical page.
    pub fn find_next_html(&self, index: usize) -> Option<usize> {
        self.find_other_page(index, |node| node.next)
    }

    /// The previous node that is a different physical page.
    pub fn find_prev_html(&self, index: usize) -> Option<usize> {
        self.find_other_page(index, |node| node.prev)
    }

    fn find_other_page(
        &self,
        index: usize,
        step: impl Fn(&LinearNode) -> Option<usize>,
    ) -> Option<usize> {
        let src = &self.nodes.get(index)?.src;
        let mut cursor = step(&self.nodes[index]);
        while let Some(i) = cursor {
            let node = &self.nodes[i];
            if node.src != *src {
                return Some(i);
            }
            cursor = step(node);
        }
        None
    }

    pub fn set_body(&mut self, index: usize, body: String) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.body = Some(body);
        }
    }

    /// Remove and return a node's body.
    pub fn take_body(&mut self, index: usize) -> Option<String> {
        self.nodes.get_mut(index).and_then(|node| node.body.take())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;
    use crate::model::{Origin, TocEntry};

    fn sample_tree() -> NavTree {
        let entries = vec![
            TocEntry::new("Cover", "cover.xhtml"),
            TocEntry::new("Part 1", "Text/part1.xhtml")
                .with_child(
                    TocEntry::new("Chapter 1", "Text/ch1.xhtml")
                        .with_child(TocEntry::new("1.1", "Text/ch1.xhtml#s1"))
                        .with_child(TocEntry::new("1.2", "Text/ch1.xhtml#s2")),
                )
                .with_child(TocEntry::new("Chapter 2", "Text/ch2.xhtml")),
            TocEntry::new("Part 2", "Text/part2.xhtml"),
        ];
        NavTree::from_entries(entries, Origin::CuratedToc)
    }

    #[test]
    fn test_levels_and_depths() {
        let linear = LinearNav::build(&sample_tree()).unwrap();
        let labels: Vec<(&str, usize)> = linear
            .nodes()
            .iter()
            .map(|n| (n.level.as_str(), n.depth))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("1", 1),
                ("2", 1),
                ("2.1", 2),
                ("2.1.1", 3),
                ("2.1.2", 3),
                ("2.2", 2),
                ("3", 1),
            ]
        );
    }

    #[test]
    fn test_links_cross_top_level_boundaries() {
        let linear = LinearNav::build(&sample_tree()).unwrap();
        // Chapter 2 (last leaf of Part 1) links to Part 2
        assert_eq!(linear.get(5).unwrap().next, Some(6));
        assert_eq!(linear.get(6).unwrap().prev, Some(5));
        assert_eq!(linear.get(0).unwrap().prev, None);
        assert_eq!(linear.get(6).unwrap().next, None);
    }

    #[test]
    fn test_path_components() {
        let linear = LinearNav::build(&sample_tree()).unwrap();
        let node = linear.get(3).unwrap();
        assert_eq!(node.html_path, "Text/ch1.xhtml");
        assert_eq!(node.src, "ch1.xhtml");
        assert_eq!(node.dir, "Text");
        assert_eq!(node.src_raw, "ch1.xhtml#s1");
        assert_eq!(linear.get(0).unwrap().dir, ".");
    }

    #[test]
    fn test_find_html_skips_same_page() {
        let linear = LinearNav::build(&sample_tree()).unwrap();
        // ch1.xhtml, ch1.xhtml#s1, ch1.xhtml#s2 are indices 2..=4
        assert_eq!(linear.find_next_html(2), Some(5));
        assert_eq!(linear.find_next_html(3), Some(5));
        assert_eq!(linear.find_prev_html(4), Some(1));
        assert_eq!(linear.find_prev_html(0), None);
        assert_eq!(linear.find_next_html(6), None);
    }

    #[test]
    fn test_empty_tree_is_malformed() {
        let err = LinearNav::build(&NavTree::new()).unwrap_err();
        assert!(matches!(err, Error::MalformedMarkup { .. }));
    }

    #[test]
    fn test_missing_href_is_malformed() {
        let entries = vec![TocEntry::new("Ok", "a.xhtml").with_child(TocEntry::new("Broken", ""))];
        let tree = NavTree::from_entries(entries, Origin::CuratedToc);
        assert!(LinearNav::build(&tree).is_err());
    }

    #[test]
    fn test_body_is_released() {
        let mut linear = LinearNav::build(&sample_tree()).unwrap();
        linear.set_body(1, "<p>x</p>".to_string());
        assert_eq!(linear.get(1).unwrap().body(), Some("<p>x</p>"));
        assert_eq!(linear.take_body(1).as_deref(), Some("<p>x</p>"));
        assert_eq!(linear.get(1).unwrap().body(), None);
    }

    fn arb_leaf() -> impl Strategy<Value = TocEntry> {
        (0u8..5, prop::option::of(0u8..3)).prop_map(|(page, fragment)| {
            let href = match fragment {
                Some(f) => format!("Text/p{page}.xhtml#f{f}"),
                None => format!("Text/p{page}.xhtml"),
            };
            TocEntry::new(format!("Page {page}"), href)
        })
    }

    fn arb_entries() -> impl Strategy<Value = Vec<TocEntry>> {
        let entry = arb_leaf().prop_recursive(4, 40, 5, |inner| {
            (arb_leaf(), prop::collection::vec(inner, 0..5)).prop_map(|(mut entry, children)| {
                entry.children = children;
                entry
            })
        });
        prop::collection::vec(entry, 1..6)
    }

    fn level_key(level: &str) -> Vec<u32> {
        level.split('.').filter_map(|p| p.parse().ok()).collect()
    }

    proptest! {
        #[test]
        fn prop_visits_every_node_once(entries in arb_entries()) {
            let tree = NavTree::from_entries(entries, Origin::CuratedToc);
            let linear = LinearNav::build(&tree).unwrap();

            prop_assert_eq!(linear.len(), tree.len());
            let ids: HashSet<NavId> = linear.nodes().iter().map(|n| n.id).collect();
            prop_assert_eq!(ids.len(), tree.len());
        }

        #[test]
        fn prop_levels_unique_and_increasing(entries in arb_entries()) {
            let tree = NavTree::from_entries(entries, Origin::CuratedToc);
            let linear = LinearNav::build(&tree).unwrap();

            let levels: HashSet<&str> = linear.nodes().iter().map(|n| n.level.as_str()).collect();
            prop_assert_eq!(levels.len(), linear.len());

            let mut last_at_depth: HashMap<usize, Vec<u32>> = HashMap::new();
            for node in linear.nodes() {
                let key = level_key(&node.level);
                prop_assert_eq!(key.len(), node.depth);
                if let Some(prev) = last_at_depth.get(&node.depth) {
                    prop_assert!(*prev < key);
                }
                last_at_depth.insert(node.depth, key);
            }
        }

        #[test]
        fn prop_single_acyclic_list(entries in arb_entries()) {
            let tree = NavTree::from_entries(entries, Origin::CuratedToc);
            let linear = LinearNav::build(&tree).unwrap();

            let mut seen = HashSet::new();
            let mut cursor = linear.head();
            let mut last = None;
            while let Some(i) = cursor {
                prop_assert!(seen.insert(i));
                let node = linear.get(i).unwrap();
                prop_assert_eq!(node.prev, last);
                last = Some(i);
                cursor = node.next;
            }
            prop_assert_eq!(seen.len(), linear.len());
            prop_assert_eq!(last, linear.tail());
        }

        #[test]
        fn prop_find_html_leaves_the_page(entries in arb_entries()) {
            let tree = NavTree::from_entries(entries, Origin::CuratedToc);
            let linear = LinearNav::build(&tree).unwrap();

            for (i, node) in linear.nodes().iter().enumerate() {
                for found in [linear.find_next_html(i), linear.find_prev_html(i)].into_iter().flatten() {
                    prop_assert_ne!(&linear.get(found).unwrap().src, &node.src);
                }
            }
        }
    }
}
