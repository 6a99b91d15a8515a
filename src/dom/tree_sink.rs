//! html5ever tree builder target.
//!
//! [`PageSink`] hands out [`DomId`]s as node handles and forwards every tree
//! edit to [`PageDom`]. Quirks mode is not tracked.

use std::borrow::Cow;
use std::cell::{Ref, RefCell};

use html5ever::tendril::StrTendril;
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{local_name, ns, Attribute as ParsedAttribute, QualName};

use super::arena::{Attribute, DomId, PageDom};

/// Name reported for handles that are not elements.
static NO_NAME: QualName = QualName {
    prefix: None,
    ns: ns!(),
    local: local_name!(""),
};

/// Builds a [`PageDom`] while html5ever parses.
#[derive(Default)]
pub struct PageSink {
    dom: RefCell<PageDom>,
}

impl PageSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_dom(self) -> PageDom {
        self.dom.into_inner()
    }

    fn attach(&self, parent: DomId, child: NodeOrText<DomId>) {
        let mut dom = self.dom.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => dom.append(parent, node),
            NodeOrText::AppendText(text) => dom.append_text(parent, &text),
        }
    }
}

fn convert_attrs(attrs: Vec<ParsedAttribute>) -> Vec<Attribute> {
    attrs
        .into_iter()
        .map(|a| Attribute {
            name: a.name,
            value: a.value.to_string(),
        })
        .collect()
}

impl TreeSink for PageSink {
    type Handle = DomId;
    type Output = Self;
    type ElemName<'a>
        = Ref<'a, QualName>
    where
        Self: 'a;

    fn finish(self) -> Self {
        self
    }

    // Content pages are rarely valid; recover silently like a browser.
    fn parse_error(&self, _msg: Cow<'static, str>) {}

    fn get_document(&self) -> DomId {
        self.dom.borrow().document()
    }

    fn elem_name<'a>(&'a self, target: &'a DomId) -> Ref<'a, QualName> {
        Ref::map(self.dom.borrow(), |dom| dom.qual_name(*target).unwrap_or(&NO_NAME))
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<ParsedAttribute>,
        _flags: ElementFlags,
    ) -> DomId {
        self.dom.borrow_mut().create_element(name, convert_attrs(attrs))
    }

    fn create_comment(&self, text: StrTendril) -> DomId {
        self.dom.borrow_mut().create_comment(text.to_string())
    }

    // Processing instructions only occur in XML; keep them as comments.
    fn create_pi(&self, target: StrTendril, data: StrTendril) -> DomId {
        self.dom.borrow_mut().create_comment(format!("?{target} {data}?"))
    }

    fn append(&self, parent: &DomId, child: NodeOrText<DomId>) {
        self.attach(*parent, child);
    }

    fn append_based_on_parent_node(
        &self,
        element: &DomId,
        prev_element: &DomId,
        child: NodeOrText<DomId>,
    ) {
        let has_parent = self.dom.borrow().parent(*element).is_some();
        if has_parent {
            self.append_before_sibling(element, child);
        } else {
            self.attach(*prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        let mut dom = self.dom.borrow_mut();
        let doctype = dom.create_doctype(name.to_string());
        let document = dom.document();
        dom.append(document, doctype);
    }

    fn get_template_contents(&self, target: &DomId) -> DomId {
        *target
    }

    fn same_node(&self, x: &DomId, y: &DomId) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn append_before_sibling(&self, sibling: &DomId, new_node: NodeOrText<DomId>) {
        let mut dom = self.dom.borrow_mut();
        match new_node {
            NodeOrText::AppendNode(node) => dom.insert_before(*sibling, node),
            NodeOrText::AppendText(text) => dom.insert_text_before(*sibling, &text),
        }
    }

    fn add_attrs_if_missing(&self, target: &DomId, attrs: Vec<ParsedAttribute>) {
        self.dom
            .borrow_mut()
            .add_missing_attrs(*target, convert_attrs(attrs));
    }

    fn remove_from_parent(&self, target: &DomId) {
        self.dom.borrow_mut().detach(*target);
    }

    fn reparent_children(&self, node: &DomId, new_parent: &DomId) {
        self.dom.borrow_mut().reparent_children(*node, *new_parent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    fn body_children(dom: &PageDom) -> Vec<DomId> {
        let body = dom.find_by_tag("body").unwrap();
        dom.children(body).collect()
    }

    #[test]
    fn test_text_and_attributes() {
        let dom = parse_html(r#"<p>Hello <img src="../Images/a.png" alt="A"/></p>"#);

        let p = dom.find_by_tag("p").unwrap();
        let text = dom.children(p).next().unwrap();
        assert_eq!(dom.text_content(text), Some("Hello "));

        let img = dom.find_by_tag("img").unwrap();
        assert_eq!(dom.get_attr(img, "src"), Some("../Images/a.png"));
        assert_eq!(dom.get_attr(img, "alt"), Some("A"));
    }

    #[test]
    fn test_implied_structure() {
        let dom = parse_html("<title>T</title><p>x</p>");
        assert!(dom.find_by_tag("head").is_some());
        assert!(dom.find_by_tag("body").is_some());
    }

    #[test]
    fn test_foster_parented_text_is_merged() {
        let dom = parse_html("<body><table>a<tr><td>b</td></tr>c</table></body>");

        let children = body_children(&dom);
        assert_eq!(children.len(), 2);
        assert_eq!(dom.text_content(children[0]), Some("ac"));
        assert_eq!(
            dom.element_name(children[1]).map(|n| n.to_string()),
            Some("table".to_string())
        );
    }

    #[test]
    fn test_repeated_html_tag_adds_missing_attrs() {
        let dom = parse_html(r#"<html lang="en"><body><html lang="fr" class="x"></body></html>"#);

        let html = dom.find_by_tag("html").unwrap();
        assert_eq!(dom.get_attr(html, "lang"), Some("en"));
        assert_eq!(dom.get_attr(html, "class"), Some("x"));
    }

    #[test]
    fn test_misnested_formatting_is_repaired() {
        let dom = parse_html("<body><b>1<p>2</b>3</p></body>");

        // The adoption agency moves "2" into a fresh <b> inside <p>.
        let p = dom.find_by_tag("p").unwrap();
        let names: Vec<_> = dom
            .children(p)
            .map(|id| dom.element_name(id).map(|n| n.to_string()))
            .collect();
        assert_eq!(names, vec![Some("b".to_string()), None]);
    }
}
