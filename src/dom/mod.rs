//! Content page DOM.
//!
//! Pages are parsed with html5ever into an arena ([`PageDom`]) so the site
//! renderer can query the title and headings, rewrite `img`/`a`/`link`
//! attributes in place and serialize the body back out.

mod arena;
mod serialize;
mod tree_sink;

pub use arena::{Attribute, ChildrenIter, DomData, DomId, DomNode, PageDom};
pub use serialize::{escape_attr, escape_text, inner_html, outer_html};
pub use tree_sink::PageSink;

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

use crate::model::href::{base_name, html_path};
use crate::util::collapse_whitespace;

/// Scraped titles longer than this many characters are assumed to be
/// captured markup rather than a title.
pub const TITLE_THRESHOLD: usize = 128;

/// Parse an HTML (or XHTML) document.
pub fn parse_html(html: &str) -> PageDom {
    let sink = PageSink::new();
    parse_document(sink, ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes())
        .into_dom()
}

/// A loaded content page.
pub struct PageDocument {
    dom: PageDom,
}

impl PageDocument {
    pub fn parse(html: &str) -> Self {
        Self {
            dom: parse_html(html),
        }
    }

    pub fn dom(&self) -> &PageDom {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut PageDom {
        &mut self.dom
    }

    pub fn head(&self) -> Option<DomId> {
        self.dom.find_by_tag("head")
    }

    pub fn body(&self) -> Option<DomId> {
        self.dom.find_by_tag("body")
    }

    /// Text of the `<title>` element, whitespace collapsed. `None` when the
    /// page has no title or it is blank.
    pub fn title(&self) -> Option<String> {
        let title = self.dom.find_by_tag("title")?;
        non_empty(collapse_whitespace(&plain_text(&self.dom, title)))
    }

    /// Text of the first `h1`, else the first `h2`, else the first `h3`.
    pub fn heading_text(&self) -> Option<String> {
        ["h1", "h2", "h3"].iter().find_map(|tag| {
            let heading = self.dom.find_by_tag(tag)?;
            non_empty(collapse_whitespace(&plain_text(&self.dom, heading)))
        })
    }

    /// Inner HTML of `<body>`; empty for a page without one.
    pub fn body_html(&self) -> String {
        self.body()
            .map(|body| inner_html(&self.dom, body))
            .unwrap_or_default()
    }

    /// The `<link>` elements of `<head>`, in document order.
    pub fn head_links(&self) -> Vec<DomId> {
        self.head()
            .map(|head| self.dom.elements_by_tag(head, &["link"]))
            .unwrap_or_default()
    }

    /// Serialized `<link>` elements of `<head>`, one per line.
    pub fn head_links_html(&self) -> String {
        self.head_links()
            .into_iter()
            .map(|id| outer_html(&self.dom, id))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

/// Pick a display title for a page: the scraped text when it is present and
/// within [`TITLE_THRESHOLD`], the page filename otherwise.
pub fn title_or_filename(scraped: Option<String>, href: &str) -> String {
    match scraped {
        Some(title) if title.chars().count() <= TITLE_THRESHOLD => title,
        _ => base_name(&html_path(href)).to_string(),
    }
}

/// Check if a tag breaks the flow of text.
fn is_block_element(tag: &str) -> bool {
    matches!(
        tag,
        "div"
            | "section"
            | "article"
            | "header"
            | "footer"
            | "nav"
            | "aside"
            | "hgroup"
            | "p"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "figure"
            | "figcaption"
            | "blockquote"
            | "ul"
            | "ol"
            | "li"
            | "table"
            | "tr"
            | "td"
            | "th"
            | "thead"
            | "tbody"
            | "main"
            | "address"
            | "pre"
            | "br"
            | "hr"
            | "dt"
            | "dd"
    )
}

/// Text under `root`, with a space at every block boundary. Script and style
/// contents are skipped. Whitespace is not collapsed.
pub fn plain_text(dom: &PageDom, root: DomId) -> String {
    let mut out = String::new();
    collect_text(dom, root, &mut out);
    out
}

fn collect_text(dom: &PageDom, id: DomId, out: &mut String) {
    for child in dom.children(id) {
        let Some(node) = dom.get(child) else {
            continue;
        };
        match &node.data {
            DomData::Text(text) => out.push_str(text),
            DomData::Element { name, .. } => {
                let tag = name.local.as_ref();
                if matches!(tag, "script" | "style") {
                    continue;
                }
                let block = is_block_element(tag);
                if block {
                    out.push(' ');
                }
                collect_text(dom, child, out);
                if block {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

/// Plain text of an HTML fragment, whitespace collapsed. Used for the
/// search index.
pub fn fragment_text(html: &str) -> String {
    let dom = parse_html(html);
    let root = dom.find_by_tag("body").unwrap_or(dom.document());
    collapse_whitespace(&plain_text(&dom, root))
}
