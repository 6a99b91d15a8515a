//! EPUB 3 navigation document parsing.
//!
//! The navigation document is XHTML; its table of contents is a `<nav>`
//! element (`epub:type="toc"`) holding nested `<ol>/<li>` lists. Each `<li>`
//! carries an `<a href>` label, or a `<span>` heading for an unlinked group.

use quick_xml::events::Event;
use quick_xml::Reader;

use super::parser::{attr, local_name, resolve_entity, resolve_href};
use crate::error::{Error, Result};
use crate::model::href::dir_name;
use crate::model::TocEntry;
use crate::util::collapse_whitespace;

#[derive(Default)]
struct ItemState {
    title: String,
    href: Option<String>,
    children: Vec<TocEntry>,
}

struct NavState {
    is_toc: bool,
    stack: Vec<ItemState>,
}

/// Parse the table of contents from a navigation document.
///
/// `nav_href` is the document's location relative to the package directory;
/// entry hrefs are resolved against its directory. The `toc` nav wins; a
/// document without one falls back to its first `<nav>`.
pub fn parse_nav_document(content: &str, nav_href: &str) -> Result<Vec<TocEntry>> {
    let mut reader = Reader::from_str(content);
    let base_dir = dir_name(nav_href);

    let mut navs: Vec<(bool, Vec<TocEntry>)> = Vec::new();
    let mut current: Option<NavState> = None;
    // Depth of open label elements (a/span) inside the current item
    let mut label_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"nav" if current.is_none() => {
                        let is_toc = attr(&e, b"epub:type")?
                            .is_some_and(|t| t.split_ascii_whitespace().any(|t| t == "toc"));
                        current = Some(NavState {
                            is_toc,
                            stack: vec![ItemState::default()],
                        });
                    }
                    b"li" => {
                        if let Some(nav) = current.as_mut() {
                            nav.stack.push(ItemState::default());
                            label_depth = 0;
                        }
                    }
                    b"a" => {
                        if let Some(item) = current_item(&mut current)
                            && item.href.is_none()
                            && item.children.is_empty()
                        {
                            item.href = attr(&e, b"href")?.map(|h| resolve_link(base_dir, nav_href, &h));
                            label_depth += 1;
                        }
                    }
                    b"span" => {
                        if let Some(item) = current_item(&mut current)
                            && item.children.is_empty()
                        {
                            label_depth += 1;
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.name();
                if local_name(name.as_ref()) == b"a"
                    && let Some(item) = current_item(&mut current)
                    && item.href.is_none()
                {
                    item.href = attr(&e, b"href")?.map(|h| resolve_link(base_dir, nav_href, &h));
                }
            }
            Ok(Event::Text(e)) => {
                if label_depth > 0
                    && let Some(item) = current_item(&mut current)
                {
                    item.title.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if label_depth > 0
                    && let Some(item) = current_item(&mut current)
                    && let Some(resolved) = resolve_entity(&e)
                {
                    item.title.push_str(&resolved);
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"a" | b"span" => label_depth = label_depth.saturating_sub(1),
                    b"li" => {
                        if let Some(nav) = current.as_mut() {
                            close_item(nav, nav_href)?;
                        }
                        label_depth = 0;
                    }
                    b"nav" => {
                        if let Some(nav) = current.take() {
                            let entries = nav
                                .stack
                                .into_iter()
                                .next()
                                .map(|root| root.children)
                                .unwrap_or_default();
                            navs.push((nav.is_toc, entries));
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::malformed(nav_href, e)),
            _ => {}
        }
    }

    let chosen = match navs.iter().position(|(is_toc, _)| *is_toc) {
        Some(index) => navs.swap_remove(index).1,
        None if !navs.is_empty() => navs.swap_remove(0).1,
        None => return Err(Error::malformed(nav_href, "no <nav> element found")),
    };
    Ok(chosen)
}

fn current_item(current: &mut Option<NavState>) -> Option<&mut ItemState> {
    current.as_mut().and_then(|nav| {
        // The root placeholder is not a list item.
        if nav.stack.len() > 1 {
            nav.stack.last_mut()
        } else {
            None
        }
    })
}

/// Pop the innermost `<li>` and attach it to its parent. Items without a link
/// cannot be navigated to, so their children move up a level.
fn close_item(nav: &mut NavState, nav_href: &str) -> Result<()> {
    if nav.stack.len() < 2 {
        return Err(Error::malformed(nav_href, "unbalanced <li>"));
    }
    let Some(item) = nav.stack.pop() else {
        return Ok(());
    };
    let Some(parent) = nav.stack.last_mut() else {
        return Ok(());
    };

    match item.href {
        Some(href) => parent.children.push(TocEntry {
            title: collapse_whitespace(&item.title),
            href,
            children: item.children,
        }),
        None => parent.children.extend(item.children),
    }
    Ok(())
}

/// Fragment-only links point into the navigation document itself.
fn resolve_link(base_dir: &str, nav_href: &str, href: &str) -> String {
    match href.trim().strip_prefix('#') {
        Some(fragment) => {
            let (path, _) = crate::model::href::split_fragment(nav_href);
            format!("{path}#{fragment}")
        }
        None => resolve_href(base_dir, href),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAV: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head><title>Navigation</title></head>
<body>
  <nav epub:type="landmarks">
    <ol><li><a href="cover.xhtml">Cover</a></li></ol>
  </nav>
  <nav epub:type="toc" id="toc">
    <h1>Contents</h1>
    <ol>
      <li><a href="ch1.xhtml">Chapter <em>One</em></a>
        <ol>
          <li><a href="ch1.xhtml#s1">Section 1.1</a></li>
          <li><a href="../Extra/notes.xhtml">Notes &amp; Errata</a></li>
        </ol>
      </li>
      <li><span>Part Two</span>
        <ol>
          <li><a href="ch2.xhtml">Chapter Two</a></li>
        </ol>
      </li>
    </ol>
  </nav>
</body>
</html>"#;

    #[test]
    fn test_parse_toc_nav() {
        let toc = parse_nav_document(NAV, "Text/nav.xhtml").unwrap();

        assert_eq!(toc.len(), 2);
        assert_eq!(toc[0].title, "Chapter One");
        assert_eq!(toc[0].href, "Text/ch1.xhtml");
        assert_eq!(toc[0].children.len(), 2);
        assert_eq!(toc[0].children[0].href, "Text/ch1.xhtml#s1");
        assert_eq!(toc[0].children[1].title, "Notes & Errata");
        assert_eq!(toc[0].children[1].href, "Extra/notes.xhtml");

        // Unlinked group heading is dropped, its children lifted
        assert_eq!(toc[1].title, "Chapter Two");
        assert_eq!(toc[1].href, "Text/ch2.xhtml");
    }

    #[test]
    fn test_first_nav_fallback() {
        let nav = r#"<html><body><nav><ol>
            <li><a href="a.xhtml">A</a></li>
        </ol></nav></body></html>"#;
        let toc = parse_nav_document(nav, "nav.xhtml").unwrap();
        assert_eq!(toc, vec![TocEntry::new("A", "a.xhtml")]);
    }

    #[test]
    fn test_missing_nav_is_malformed() {
        let err = parse_nav_document("<html><body/></html>", "nav.xhtml").unwrap_err();
        assert!(matches!(err, Error::MalformedMarkup { .. }));
    }

    #[test]
    fn test_mismatched_tags_are_malformed() {
        let nav = "<html><body><nav><ol><li><a href='a.xhtml'>A</li></ol></nav></body></html>";
        assert!(parse_nav_document(nav, "nav.xhtml").is_err());
    }
}
