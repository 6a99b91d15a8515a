//! HTML serialization of a [`PageDom`] subtree.

use super::arena::{DomData, DomId, PageDom};

/// Elements that never have content or a closing tag.
fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Elements whose text children are written without escaping.
fn is_raw_text_element(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

/// Escape text content.
pub fn escape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '\u{a0}' => result.push_str("&nbsp;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape a double-quoted attribute value.
pub fn escape_attr(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\u{a0}' => result.push_str("&nbsp;"),
            _ => result.push(c),
        }
    }
    result
}

/// Serialize the children of `id` (its inner HTML).
pub fn inner_html(dom: &PageDom, id: DomId) -> String {
    let mut out = String::new();
    for child in dom.children(id) {
        write_node(dom, child, false, &mut out);
    }
    out
}

/// Serialize `id` itself and its descendants (its outer HTML).
pub fn outer_html(dom: &PageDom, id: DomId) -> String {
    let mut out = String::new();
    write_node(dom, id, false, &mut out);
    out
}

fn write_node(dom: &PageDom, id: DomId, raw_text: bool, out: &mut String) {
    let Some(node) = dom.get(id) else {
        return;
    };

    match &node.data {
        DomData::Document => {
            for child in dom.children(id) {
                write_node(dom, child, false, out);
            }
        }
        DomData::Doctype { name } => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        DomData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        DomData::Text(text) => {
            if raw_text {
                out.push_str(text);
            } else {
                out.push_str(&escape_text(text));
            }
        }
        DomData::Element { name, attrs } => {
            let tag = name.local.as_ref();
            out.push('<');
            out.push_str(tag);
            for attr in attrs {
                out.push(' ');
                if let Some(prefix) = &attr.name.prefix {
                    out.push_str(prefix.as_ref());
                    out.push(':');
                }
                out.push_str(attr.name.local.as_ref());
                out.push_str("=\"");
                out.push_str(&escape_attr(&attr.value));
                out.push('"');
            }
            out.push('>');

            if is_void_element(tag) {
                return;
            }

            let raw = is_raw_text_element(tag);
            for child in dom.children(id) {
                write_node(dom, child, raw, out);
            }

            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    #[test]
    fn test_inner_html_of_body() {
        let dom = parse_html(r#"<html><body><p class="x">a &amp; b<br/>c</p></body></html>"#);
        let body = dom.find_by_tag("body").unwrap();
        assert_eq!(inner_html(&dom, body), r#"<p class="x">a &amp; b<br>c</p>"#);
    }

    #[test]
    fn test_script_text_is_raw() {
        let dom = parse_html("<body><script>if (a < b) {}</script></body>");
        let body = dom.find_by_tag("body").unwrap();
        assert_eq!(inner_html(&dom, body), "<script>if (a < b) {}</script>");
    }

    #[test]
    fn test_attribute_quotes_escaped() {
        let dom = parse_html(r#"<body><a title='say "hi"' href="a.html">x</a></body>"#);
        let a = dom.find_by_tag("a").unwrap();
        assert_eq!(
            outer_html(&dom, a),
            r#"<a title="say &quot;hi&quot;" href="a.html">x</a>"#
        );
    }
}
