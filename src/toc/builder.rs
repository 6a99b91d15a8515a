//! Initial navigation tree.
//!
//! The tree comes from the first source that exists, in order:
//!
//! 1. the curated TOC (NCX)
//! 2. the navigation document
//! 3. the spine, one top-level node per page, titled from the page's `<title>`
//!
//! Guide entries are then merged ahead of the existing top-level nodes, with
//! the cover first.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::dom::title_or_filename;
use crate::epub::{curated_toc, navigation_toc, ContentSource};
use crate::error::Result;
use crate::model::href::html_path;
use crate::model::{GuideEntry, NavTree, Origin, Package};

/// Build the navigation tree from the best available source, then merge the
/// guide. `spine` holds the package's spine hrefs in reading order.
pub fn build_initial(
    package: &Package,
    spine: &[&str],
    source: &dyn ContentSource,
) -> Result<NavTree> {
    let mut tree = if let Some(entries) = curated_toc(package, source)? {
        info!(entries = entries.len(), "using curated TOC");
        NavTree::from_entries(entries, Origin::CuratedToc)
    } else if let Some(entries) = navigation_toc(package, source)? {
        info!(entries = entries.len(), "using navigation document");
        NavTree::from_entries(entries, Origin::NavDocument)
    } else {
        info!("no table of contents, synthesizing from spine");
        synthesize_from_spine(spine, source)?
    };

    merge_guide(&mut tree, &package.guide);
    Ok(tree)
}

/// A flat tree with one node per spine page.
pub fn synthesize_from_spine(spine: &[&str], source: &dyn ContentSource) -> Result<NavTree> {
    let mut tree = NavTree::new();
    for &href in spine {
        let page = source.load_page(&html_path(href))?;
        let title = title_or_filename(page.title(), href);
        debug!(href, %title, "synthesized spine node");
        tree.push_root(title, href, Origin::SpineSynthesized);
    }
    Ok(tree)
}

/// Merge guide entries into the top level of `tree`.
///
/// Non-cover entries go in front of the existing top-level nodes, keeping
/// guide order among themselves; the cover then goes strictly first. An entry
/// whose fragment-stripped href already appears anywhere in the tree is
/// skipped, as is a repeated guide href.
pub fn merge_guide(tree: &mut NavTree, guide: &[GuideEntry]) {
    let mut seen: HashSet<String> = tree
        .preorder()
        .into_iter()
        .map(|id| tree.node(id).html_path())
        .collect();

    let mut insert_at = 0;
    for entry in guide.iter().filter(|g| !g.is_cover()) {
        if seen.insert(html_path(&entry.href)) {
            debug!(kind = %entry.kind, href = %entry.href, "merging guide entry");
            tree.insert_root(insert_at, entry.title.clone(), entry.href.clone(), Origin::Guide);
            insert_at += 1;
        }
    }

    if let Some(cover) = guide.iter().find(|g| g.is_cover())
        && seen.insert(html_path(&cover.href))
    {
        debug!(href = %cover.href, "merging cover");
        tree.insert_root(0, cover.title.clone(), cover.href.clone(), Origin::Guide);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::MemorySource;
    use crate::model::{ManifestItem, SpineItem, TocEntry};

    fn tree_of(hrefs: &[&str]) -> NavTree {
        let entries = hrefs.iter().map(|h| TocEntry::new(*h, *h)).collect();
        NavTree::from_entries(entries, Origin::CuratedToc)
    }

    #[test]
    fn test_guide_merge_cover_first() {
        let mut tree = tree_of(&["chapter1.html"]);
        let guide = vec![
            GuideEntry::new("toc", "Table of Contents", "toc.html"),
            GuideEntry::new("cover", "Cover", "cover.html"),
        ];

        merge_guide(&mut tree, &guide);
        assert_eq!(tree.root_hrefs(), vec!["cover.html", "toc.html", "chapter1.html"]);
        assert_eq!(tree.node(tree.roots()[0]).origin, Origin::Guide);
    }

    #[test]
    fn test_guide_merge_keeps_guide_order() {
        let mut tree = tree_of(&["ch1.html"]);
        let guide = vec![
            GuideEntry::new("title-page", "Title", "title.html"),
            GuideEntry::new("copyright-page", "Copyright", "copy.html"),
        ];

        merge_guide(&mut tree, &guide);
        assert_eq!(tree.root_hrefs(), vec!["title.html", "copy.html", "ch1.html"]);
    }

    #[test]
    fn test_guide_merge_skips_existing_href() {
        let entries = vec![
            TocEntry::new("Part", "part.html").with_child(TocEntry::new("Notes", "notes.html#n1")),
        ];
        let mut tree = NavTree::from_entries(entries, Origin::CuratedToc);
        let guide = vec![
            GuideEntry::new("notes", "Notes", "notes.html"),
            GuideEntry::new("cover", "Cover", "part.html#top"),
            GuideEntry::new("preface", "Preface", "preface.html"),
        ];

        merge_guide(&mut tree, &guide);
        assert_eq!(tree.root_hrefs(), vec!["preface.html", "part.html"]);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_synthesize_from_spine_titles() {
        let package = Package {
            manifest: vec![
                ManifestItem {
                    id: "a".into(),
                    href: "Text/a.xhtml".into(),
                    media_type: "application/xhtml+xml".into(),
                    is_navigation_document: false,
                },
                ManifestItem {
                    id: "b".into(),
                    href: "Text/b.xhtml".into(),
                    media_type: "application/xhtml+xml".into(),
                    is_navigation_document: false,
                },
            ],
            spine: vec![SpineItem { idref: "a".into() }, SpineItem { idref: "b".into() }],
            ..Package::default()
        };
        let long_title = "t".repeat(200);
        let source = MemorySource::new()
            .with_file("Text/a.xhtml", "<html><head><title>Alpha</title></head><body/></html>")
            .with_file(
                "Text/b.xhtml",
                format!("<html><head><title>{long_title}</title></head><body/></html>"),
            );

        let tree = build_initial(&package, &package.spine_hrefs(), &source).unwrap();
        assert_eq!(tree.root_hrefs(), vec!["Text/a.xhtml", "Text/b.xhtml"]);
        assert_eq!(tree.node(tree.roots()[0]).title, "Alpha");
        assert_eq!(tree.node(tree.roots()[1]).title, "b.xhtml");
        assert_eq!(tree.node(tree.roots()[1]).origin, Origin::SpineSynthesized);
    }

    #[test]
    fn test_curated_toc_wins_over_nav_document() {
        let package = Package {
            manifest: vec![ManifestItem {
                id: "nav".into(),
                href: "nav.xhtml".into(),
                media_type: "application/xhtml+xml".into(),
                is_navigation_document: true,
            }],
            ..Package::default()
        };
        let source = MemorySource::new()
            .with_file(
                "toc.ncx",
                r#"<ncx><navMap><navPoint><navLabel><text>From NCX</text></navLabel>
                   <content src="a.xhtml"/></navPoint></navMap></ncx>"#,
            )
            .with_file(
                "nav.xhtml",
                r#"<html><body><nav><ol><li><a href="b.xhtml">From nav</a></li></ol></nav></body></html>"#,
            );

        let tree = build_initial(&package, &["a.xhtml"], &source).unwrap();
        assert_eq!(tree.root_hrefs(), vec!["a.xhtml"]);
        assert_eq!(tree.node(tree.roots()[0]).origin, Origin::CuratedToc);
    }
}
