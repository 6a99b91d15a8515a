//! Href normalization and link classification.
//!
//! Package documents address pages with raw hrefs relative to the content
//! root (`Text/ch01.xhtml#sec-2`). The site addresses the same pages by a flat
//! output filename (`ch01.html#sec-2`). This module converts between the two:
//!
//! - **HtmlPath**: fragment stripped, percent-decoded (`Text/ch01.xhtml`)
//! - **Src**: basename of HtmlPath (`ch01.xhtml`)
//! - **Dir**: directory portion of the raw href (`Text`, or `.`)
//! - **SrcRaw**: basename of the raw href, fragment included (`ch01.xhtml#sec-2`)

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

use crate::error::{Error, Result};

/// The single extension every rendered page is written with.
pub const OUTPUT_EXTENSION: &str = "html";

/// Markup extensions that only exist in the source package.
const SOURCE_MARKUP_EXTENSIONS: &[&str] = &["xhtml", "xht", "htm", "xml"];

/// Extension some packages give to bare image-wrapper pages.
const PLACEHOLDER_EXTENSION: &str = "";

/// A parsed href, classified by how it must be rewritten.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Link<'a> {
    /// Absolute or external URL (`https://`, `mailto:`, `/root.css`, `data:`...).
    External(&'a str),

    /// Fragment-only link within the current page (`#note-1`).
    Fragment(&'a str),

    /// Relative link to another file in the package.
    Relative {
        path: &'a str,
        fragment: Option<&'a str>,
    },
}

impl<'a> Link<'a> {
    /// Classify a raw href.
    pub fn parse(href: &'a str) -> Link<'a> {
        let href = href.trim();

        if is_external(href) {
            return Link::External(href);
        }

        if let Some(fragment) = href.strip_prefix('#') {
            return Link::Fragment(fragment);
        }

        let (path, fragment) = split_fragment(href);
        Link::Relative { path, fragment }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Link::External(_))
    }
}

/// Whether an href leaves the package: has a URL scheme, or is absolute.
pub fn is_external(href: &str) -> bool {
    if href.starts_with('/') {
        return true;
    }

    // A scheme is letters/digits/+/-/. followed by ':' before any '/', '#' or '?'
    match href.find(':') {
        Some(colon) => {
            let scheme = &href[..colon];
            !scheme.is_empty()
                && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Split `path#fragment` into its parts.
pub fn split_fragment(href: &str) -> (&str, Option<&str>) {
    match href.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (href, None),
    }
}

/// Percent-decode a path. Invalid UTF-8 sequences are replaced, not rejected.
pub fn percent_decode(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// HtmlPath: the href with its fragment stripped and percent-decoded.
pub fn html_path(href: &str) -> String {
    percent_decode(split_fragment(href).0)
}

/// Last path component (`a/b/c.html` -> `c.html`).
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(i) => &trimmed[i + 1..],
        None => trimmed,
    }
}

/// Directory portion of a path; `.` when there is none.
pub fn dir_name(path: &str) -> &str {
    let (path, _) = split_fragment(path);
    match path.rfind('/') {
        Some(0) => "/",
        Some(i) => &path[..i],
        None => ".",
    }
}

/// Extension of the last path component, without the dot.
///
/// Returns an empty string for names without one (`README`, `.hidden`).
pub fn extension(name: &str) -> &str {
    let name = base_name(name);
    match name.rfind('.') {
        Some(0) | None => "",
        Some(i) => &name[i + 1..],
    }
}

fn is_source_markup(ext: &str) -> bool {
    SOURCE_MARKUP_EXTENSIONS
        .iter()
        .any(|m| m.eq_ignore_ascii_case(ext))
}

fn replace_extension(name: &str, ext: &str) -> String {
    let stem = if ext.is_empty() {
        name
    } else {
        &name[..name.len() - ext.len() - 1]
    };
    format!("{stem}.{OUTPUT_EXTENSION}")
}

/// Map a source-only markup extension (or the placeholder extension) to the
/// output extension. Any other name is returned unchanged.
///
/// Idempotent: a normalized name normalizes to itself.
pub fn normalize_extension(name: &str) -> Cow<'_, str> {
    if name.is_empty() || name.ends_with('/') || name == "." || name == ".." {
        return Cow::Borrowed(name);
    }

    let ext = extension(name);
    if is_source_markup(ext) || ext == PLACEHOLDER_EXTENSION {
        Cow::Owned(replace_extension(name, ext))
    } else {
        Cow::Borrowed(name)
    }
}

/// The final output filename for a page whose Src is `src`.
///
/// Unlike [`normalize_extension`], unknown extensions are rejected: a page
/// must end up as an `.html` file.
pub fn output_filename(src: &str) -> Result<String> {
    let ext = extension(src);
    if ext.eq_ignore_ascii_case(OUTPUT_EXTENSION) {
        return Ok(src.to_string());
    }
    if is_source_markup(ext) || ext == PLACEHOLDER_EXTENSION {
        return Ok(replace_extension(src, ext));
    }
    Err(Error::UnsupportedContentType(src.to_string()))
}

/// Canonical link target for a relative page href: the basename with its
/// extension normalized, fragment kept (`../Text/ch2.xhtml#s1` -> `ch2.html#s1`).
pub fn page_link(href: &str) -> String {
    let (path, fragment) = split_fragment(href);
    let name = normalize_extension(base_name(path));
    match fragment {
        Some(fragment) => format!("{name}#{fragment}"),
        None => name.into_owned(),
    }
}

/// Resolve a relative path against a base directory, collapsing `.` and `..`.
///
/// `resolve_relative_path("Text", "../Images/a.png")` -> `Images/a.png`.
/// Components that would climb above the root are dropped.
pub fn resolve_relative_path(base_dir: &str, relative: &str) -> String {
    let mut components: Vec<&str> = base_dir
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();

    for part in relative.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            _ => components.push(part),
        }
    }

    let mut joined = components.join("/");
    if relative.ends_with('/') && !joined.is_empty() {
        joined.push('/');
    }
    joined
}
