//! Merge the spine into the navigation tree.
//!
//! A table of contents may leave out pages the spine visits. Every such page
//! is inserted so it stays reachable and takes part in pagination:
//!
//! - the first spine page goes in front of the top level
//! - any later page becomes the last child of the node for the nearest
//!   earlier spine page already in the tree
//!
//! A page inserted as a child is looked up as its anchor afterwards, so a run
//! of missing pages ends up as sibling children of one anchor, in spine order.
//! The page inserted in front stands for itself.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::dom::title_or_filename;
use crate::epub::ContentSource;
use crate::error::{Error, Result};
use crate::model::href::html_path;
use crate::model::{NavId, NavTree, Origin};

/// Insert every spine page missing from `tree`. Returns the number of
/// inserted nodes.
///
/// `title_for` supplies the display title of an inserted page from its raw
/// href; see [`heading_title`].
pub fn reconcile<F>(tree: &mut NavTree, spine: &[&str], mut title_for: F) -> Result<usize>
where
    F: FnMut(&str) -> Result<String>,
{
    let mut lookup: HashMap<String, NavId> = HashMap::new();
    for id in tree.preorder() {
        lookup.entry(tree.node(id).html_path()).or_insert(id);
    }

    let mut inserted = 0;
    for (index, href) in spine.iter().enumerate() {
        let key = html_path(href);
        if lookup.contains_key(&key) {
            continue;
        }

        let title = title_for(href)?;
        let target = if index == 0 {
            debug!(href, "inserting first spine page at the front");
            tree.insert_root(0, title, *href, Origin::SpineSynthesized)
        } else {
            let anchor = spine[..index]
                .iter()
                .rev()
                .find_map(|prior| lookup.get(&html_path(prior)).copied())
                .ok_or_else(|| Error::UnplaceableSpinePage(href.to_string()))?;
            debug!(href, anchor = %tree.node(anchor).href, "inserting spine page");
            tree.push_child(anchor, title, *href, Origin::SpineSynthesized);
            anchor
        };

        lookup.insert(key, target);
        inserted += 1;
    }

    if inserted > 0 {
        info!(inserted, "reconciled spine with table of contents");
    }
    Ok(inserted)
}

/// Title of a page missing from the TOC: its first `h1`, `h2` or `h3`,
/// falling back to the filename.
pub fn heading_title(source: &dyn ContentSource, href: &str) -> Result<String> {
    let page = source.load_page(&html_path(href))?;
    Ok(title_or_filename(page.heading_text(), href))
}
