//! Link rewriting for flattened output.
//!
//! Every page is written to the output root, so references inside a page can
//! no longer be relative to the page's own directory:
//!
//! - media and stylesheet references are resolved against the page directory
//!   and become root-relative (`../Images/a.png` in `Text/` -> `Images/a.png`)
//! - links to other pages become the target's output filename
//!   (`../Text/ch2.xhtml#s1` -> `ch2.html#s1`)
//!
//! External, absolute and fragment-only references are left alone.

use crate::dom::{DomId, PageDocument, PageDom};
use crate::model::href::{output_filename, page_link, resolve_relative_path, Link};

/// Elements carrying media references, with the attributes to rewrite.
const MEDIA_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("img", &["src"]),
    ("image", &["href"]),
    ("video", &["src", "poster"]),
    ("audio", &["src"]),
    ("source", &["src"]),
    ("track", &["src"]),
    ("embed", &["src"]),
    ("object", &["data"]),
];

/// Rewrite the references of a page found in directory `dir` (`.` for the
/// package root). Returns the number of attributes changed.
pub fn rewrite_page(page: &mut PageDocument, dir: &str) -> usize {
    let mut changed = 0;

    for (tag, attrs) in MEDIA_ATTRIBUTES {
        let elements = page.dom().elements_by_tag(page.dom().document(), &[*tag]);
        for id in elements {
            for attr in attrs.iter() {
                changed += rewrite_attr(page.dom_mut(), id, attr, |href| resolve_asset(dir, href));
            }
        }
    }

    for id in page.head_links() {
        changed += rewrite_attr(page.dom_mut(), id, "href", |href| resolve_asset(dir, href));
    }

    if let Some(body) = page.body() {
        for id in page.dom().elements_by_tag(body, &["a", "area"]) {
            changed += rewrite_attr(page.dom_mut(), id, "href", |href| resolve_anchor(dir, href));
        }
    }

    changed
}

fn rewrite_attr(
    dom: &mut PageDom,
    id: DomId,
    attr: &str,
    rewrite: impl Fn(&str) -> Option<String>,
) -> usize {
    let Some(new_value) = dom.get_attr(id, attr).and_then(&rewrite) else {
        return 0;
    };
    if dom.set_attr(id, attr, new_value) { 1 } else { 0 }
}

/// Root-relative form of a media or stylesheet reference.
pub fn resolve_asset(dir: &str, href: &str) -> Option<String> {
    match Link::parse(href) {
        Link::Relative { path, fragment } if !path.is_empty() => {
            let resolved = resolve_relative_path(dir, path);
            Some(match fragment {
                Some(fragment) => format!("{resolved}#{fragment}"),
                None => resolved,
            })
        }
        _ => None,
    }
}

/// Output form of an anchor href. Links to pages become the page's output
/// filename; links to other files are treated like assets.
pub fn resolve_anchor(dir: &str, href: &str) -> Option<String> {
    match Link::parse(href) {
        Link::Relative { path, .. } if !path.is_empty() => {
            if output_filename(path).is_ok() {
                Some(page_link(href.trim()))
            } else {
                resolve_asset(dir, href)
            }
        }
        _ => None,
    }
}
