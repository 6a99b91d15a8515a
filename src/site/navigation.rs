//! Navigation menu rendering.
//!
//! The menu is built once from the final tree ([`Navigation::snapshot`]) and
//! rendered for every page; only the highlighted entries change.

use handlebars::Handlebars;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::href::{base_name, html_path, normalize_extension, page_link};
use crate::model::{NavId, NavTree};
use crate::toc::LinearNav;

/// Template name of the navigation menu.
pub(crate) const NAVIGATION: &str = "navigation";

/// One menu entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub title: String,
    /// Link target: output filename, fragment kept.
    pub link: String,
    /// Output filename of the page the entry points into.
    pub file: String,
    pub level: String,
    pub children: Vec<NavEntry>,
}

/// Frozen copy of the navigation tree, ready to render.
#[derive(Debug, Clone, Default)]
pub struct Navigation {
    entries: Vec<NavEntry>,
}

#[derive(Serialize)]
struct NavItemView<'a> {
    title: &'a str,
    link: &'a str,
    level: &'a str,
    active: bool,
    items: Vec<NavItemView<'a>>,
}

#[derive(Serialize)]
struct NavigationView<'a> {
    items: Vec<NavItemView<'a>>,
}

impl Navigation {
    /// Snapshot `tree`, labelling entries with the levels from `linear`.
    pub fn snapshot(tree: &NavTree, linear: &LinearNav) -> Self {
        let entries = tree
            .roots()
            .iter()
            .map(|&id| snapshot_entry(tree, linear, id))
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[NavEntry] {
        &self.entries
    }

    /// Render the menu for the page written to `current_file`.
    pub fn render(&self, handlebars: &Handlebars<'_>, current_file: &str) -> Result<String> {
        let view = NavigationView {
            items: view_entries(&self.entries, current_file),
        };
        handlebars
            .render(NAVIGATION, &view)
            .map_err(|e| Error::Template(e.to_string()))
    }
}

fn snapshot_entry(tree: &NavTree, linear: &LinearNav, id: NavId) -> NavEntry {
    let node = tree.node(id);
    let level = linear
        .index_of(id)
        .and_then(|index| linear.get(index))
        .map(|n| n.level.clone())
        .unwrap_or_default();

    NavEntry {
        title: node.title.clone(),
        link: page_link(&node.href),
        file: normalize_extension(base_name(&html_path(&node.href))).into_owned(),
        level,
        children: node
            .children()
            .iter()
            .map(|&child| snapshot_entry(tree, linear, child))
            .collect(),
    }
}

fn view_entries<'a>(entries: &'a [NavEntry], current_file: &str) -> Vec<NavItemView<'a>> {
    entries
        .iter()
        .map(|entry| NavItemView {
            title: &entry.title,
            link: &entry.link,
            level: &entry.level,
            active: entry.file == current_file,
            items: view_entries(&entry.children, current_file),
        })
        .collect()
}
