//! Full-text search index.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dom::fragment_text;
use crate::error::Result;
use crate::model::href::{output_filename, page_link};
use crate::toc::LinearNav;

/// One physical page in the search index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub title: String,
    #[serde(rename = "bodyText")]
    pub body_text: String,
    pub url: String,
}

/// Search index keyed by output filename.
pub type SearchIndex = BTreeMap<String, IndexEntry>;

/// Index the rendered bodies held by `linear`, head to tail.
///
/// The first entry for a physical page provides its title and url; later
/// entries for the same page are skipped. Every body is released, indexed
/// or not.
pub fn build_index(linear: &mut LinearNav) -> Result<SearchIndex> {
    let mut index = SearchIndex::new();
    let mut seen = HashSet::new();

    for position in 0..linear.len() {
        let body = linear.take_body(position);
        let Some(node) = linear.get(position) else {
            continue;
        };
        if !seen.insert(node.src.clone()) {
            continue;
        }

        let filename = output_filename(&node.src)?;
        let entry = IndexEntry {
            title: node.title.clone(),
            body_text: body.as_deref().map(fragment_text).unwrap_or_default(),
            url: page_link(&node.href),
        };
        index.insert(filename, entry);
    }

    info!(pages = index.len(), "built search index");
    Ok(index)
}

/// Write the index as a single JSON object.
pub fn write_index(path: &Path, index: &SearchIndex) -> Result<()> {
    let json = serde_json::to_string(index)?;
    fs::write(path, json)?;
    Ok(())
}
