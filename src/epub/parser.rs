//! EPUB package parsing (container.xml, OPF, NCX).

use quick_xml::escape::{resolve_xml_entity, unescape_with};
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::href::{dir_name, is_external, resolve_relative_path, split_fragment};
use crate::model::{GuideEntry, ManifestItem, Package, SpineItem, TocEntry};
use crate::util::collapse_whitespace;

/// Parse META-INF/container.xml to find the OPF path.
pub fn parse_container_xml(content: &str) -> Result<String> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"rootfile" => {
                if let Some(path) = attr(&e, b"full-path")? {
                    return Ok(path);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::malformed("container.xml", e)),
            _ => {}
        }
    }

    Err(Error::malformed(
        "container.xml",
        "no rootfile found in container.xml",
    ))
}

/// Parse OPF package document.
pub fn parse_opf(content: &str) -> Result<Package> {
    let mut reader = Reader::from_str(content);

    let mut package = Package::default();
    let mut in_metadata = false;
    let mut current_element: Option<&'static str> = None;
    let mut buf_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                match local {
                    b"metadata" => in_metadata = true,
                    b"title" | b"creator" | b"language" if in_metadata => {
                        current_element = Some(match local {
                            b"title" => "title",
                            b"creator" => "creator",
                            _ => "language",
                        });
                        buf_text.clear();
                    }
                    _ => handle_opf_element(&e, &mut package)?,
                }
            }
            Ok(Event::Empty(e)) => handle_opf_element(&e, &mut package)?,
            Ok(Event::Text(e)) => {
                if current_element.is_some() {
                    buf_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::CData(e)) => {
                if current_element.is_some() {
                    buf_text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if current_element.is_some()
                    && let Some(resolved) = resolve_entity(&e)
                {
                    buf_text.push_str(&resolved);
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                if local_name(name.as_ref()) == b"metadata" {
                    in_metadata = false;
                }

                if let Some(elem) = current_element.take() {
                    let value = collapse_whitespace(&buf_text);
                    let metadata = &mut package.metadata;
                    match elem {
                        "title" if metadata.title.is_empty() => metadata.title = value,
                        "creator" => metadata.authors.push(value),
                        "language" if metadata.language.is_empty() => metadata.language = value,
                        _ => {}
                    }
                    buf_text.clear();
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::malformed("package document", e)),
            _ => {}
        }
    }

    Ok(package)
}

/// Manifest, spine and guide elements may be written empty or with children.
fn handle_opf_element(e: &BytesStart<'_>, package: &mut Package) -> Result<()> {
    let name = e.name();
    match local_name(name.as_ref()) {
        b"item" => {
            let id = attr(e, b"id")?.unwrap_or_default();
            if id.is_empty() {
                return Ok(());
            }
            let properties = attr(e, b"properties")?.unwrap_or_default();
            package.manifest.push(ManifestItem {
                id,
                href: attr(e, b"href")?.unwrap_or_default(),
                media_type: attr(e, b"media-type")?.unwrap_or_default(),
                is_navigation_document: properties.split_ascii_whitespace().any(|p| p == "nav"),
            });
        }
        b"itemref" => {
            if let Some(idref) = attr(e, b"idref")? {
                package.spine.push(SpineItem { idref });
            }
        }
        b"spine" => package.toc_id = attr(e, b"toc")?,
        b"reference" => {
            let href = attr(e, b"href")?.unwrap_or_default();
            if href.is_empty() {
                tracing::warn!("guide reference without href, skipping");
                return Ok(());
            }
            package.guide.push(GuideEntry {
                kind: attr(e, b"type")?.unwrap_or_default(),
                title: attr(e, b"title")?.unwrap_or_default(),
                href,
            });
        }
        _ => {}
    }
    Ok(())
}

/// Parse NCX table of contents.
///
/// `ncx_href` is the NCX location relative to the package directory; entry
/// hrefs are resolved against its directory.
pub fn parse_ncx(content: &str, ncx_href: &str) -> Result<Vec<TocEntry>> {
    let mut reader = Reader::from_str(content);
    let base_dir = dir_name(ncx_href);

    struct NavPointState {
        children: Vec<TocEntry>,
        text: String,
        src: Option<String>,
    }

    let mut stack: Vec<NavPointState> = vec![NavPointState {
        children: Vec::new(),
        text: String::new(),
        src: None,
    }];
    let mut in_text = false;

    // The first content element of a navPoint wins.
    fn set_ncx_src(e: &BytesStart<'_>, state: Option<&mut NavPointState>) -> Result<()> {
        if let Some(state) = state
            && state.src.is_none()
        {
            state.src = attr(e, b"src")?;
        }
        Ok(())
    }

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"navPoint" => stack.push(NavPointState {
                        children: Vec::new(),
                        text: String::new(),
                        src: None,
                    }),
                    b"text" => in_text = true,
                    b"content" => set_ncx_src(&e, stack.last_mut())?,
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.name();
                if local_name(name.as_ref()) == b"content" {
                    set_ncx_src(&e, stack.last_mut())?;
                }
            }
            Ok(Event::Text(e)) => {
                if in_text && let Some(state) = stack.last_mut() {
                    state.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::CData(e)) => {
                if in_text && let Some(state) = stack.last_mut() {
                    state.text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_text
                    && let Some(state) = stack.last_mut()
                    && let Some(resolved) = resolve_entity(&e)
                {
                    state.text.push_str(&resolved);
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"text" => in_text = false,
                    b"navPoint" => {
                        if stack.len() < 2 {
                            return Err(Error::malformed("NCX", "unbalanced navPoint"));
                        }
                        if let Some(state) = stack.pop()
                            && let Some(parent) = stack.last_mut()
                        {
                            match state.src {
                                Some(src) => {
                                    let mut entry = TocEntry::new(
                                        collapse_whitespace(&state.text),
                                        resolve_href(base_dir, &src),
                                    );
                                    entry.children = state.children;
                                    parent.children.push(entry);
                                }
                                // A navPoint without content cannot be linked to;
                                // its children move up a level.
                                None => parent.children.extend(state.children),
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::malformed(ncx_href, e)),
            _ => {}
        }
    }

    Ok(stack.into_iter().next().map(|s| s.children).unwrap_or_default())
}


/// Resolve a document-relative href to a package-relative one.
///
/// External hrefs pass through; the fragment is kept.
pub(crate) fn resolve_href(base_dir: &str, href: &str) -> String {
    let href = href.trim();
    if is_external(href) || base_dir == "." {
        return href.to_string();
    }
    let (path, fragment) = split_fragment(href);
    let resolved = resolve_relative_path(base_dir, path);
    match fragment {
        Some(fragment) => format!("{resolved}#{fragment}"),
        None => resolved,
    }
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

/// Read an attribute value by its full name, unescaping entities.
///
/// A value with a stray `&` or an unknown entity is kept as written.
pub(crate) fn attr(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            let raw = String::from_utf8(attr.value.to_vec())
                .map_err(|err| Error::malformed("attribute", err))?;
            let value = match unescape_with(&raw, named_entity) {
                Ok(value) => value.into_owned(),
                Err(err) => {
                    debug!(%err, value = %raw, "attribute kept as written");
                    raw.clone()
                }
            };
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// Extract local name from namespaced XML name (e.g., "dc:title" -> "title").
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

/// Named entities understood in package documents: the XML five plus `nbsp`.
fn named_entity(name: &str) -> Option<&'static str> {
    resolve_xml_entity(name).or(match name {
        "nbsp" => Some("\u{a0}"),
        _ => None,
    })
}

/// Resolve a general entity reference from a text event.
pub(crate) fn resolve_entity(entity: &BytesRef<'_>) -> Option<String> {
    match entity.resolve_char_ref() {
        Ok(Some(c)) => Some(c.to_string()),
        Ok(None) => entity
            .decode()
            .ok()
            .and_then(|name| named_entity(&name))
            .map(str::to_string),
        Err(_) => None,
    }
}
