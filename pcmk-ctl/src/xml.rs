//! Minimal read-only element tree for cluster XML documents.
//!
//! `crm_mon --as-xml` and `cibadmin --query` outputs are small, so they are
//! parsed eagerly into an owned tree and queried by walking it. Text nodes
//! are dropped: every value the cluster tooling reports lives in attributes.

use quick_xml::Reader;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

/// XML parse errors.
#[derive(Debug, Error)]
pub enum XmlError {
    #[error(transparent)]
    Syntax(#[from] quick_xml::Error),

    #[error(transparent)]
    Attribute(#[from] AttrError),

    #[error("document has no root element")]
    Empty,

    #[error("content after the root element <{0}>")]
    TrailingContent(String),

    #[error("unbalanced document, <{0}> is never closed")]
    Unclosed(String),
}

/// An element with its attributes and child elements in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
}

impl Element {
    /// Parse a complete document and return its root element.
    pub fn parse(xml: &str) -> Result<Element, XmlError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut open: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => open.push(Element::from_start(&start)?),
                Event::Empty(start) => {
                    let element = Element::from_start(&start)?;
                    attach(&mut open, &mut root, element)?;
                }
                Event::End(_) => {
                    // quick-xml already rejects mismatched end tags
                    if let Some(element) = open.pop() {
                        attach(&mut open, &mut root, element)?;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(element) = open.pop() {
            return Err(XmlError::Unclosed(element.name));
        }
        root.ok_or(XmlError::Empty)
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Element, XmlError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }
        Ok(Element {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Direct children with the given tag name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// This element and everything below it, in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

fn attach(
    open: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), XmlError> {
    if let Some(parent) = open.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    match root {
        Some(existing) => Err(XmlError::TrailingContent(existing.name.clone())),
        None => {
            *root = Some(element);
            Ok(())
        }
    }
}

/// Pre-order walk over an element subtree.
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_document() {
        let root = Element::parse(
            r#"<?xml version="1.0"?>
            <crm_mon version="2.0.5">
              <resources>
                <resource id="vip" role="Started"/>
                <clone id="haproxy-clone" multi_state="false">
                  <resource id="haproxy" role="Started"></resource>
                </clone>
              </resources>
            </crm_mon>"#,
        )
        .unwrap();

        assert_eq!(root.name, "crm_mon");
        assert_eq!(root.attr("version"), Some("2.0.5"));
        let resources = root.children_named("resources").next().unwrap();
        assert_eq!(resources.children.len(), 2);
        assert_eq!(resources.children[1].attr("multi_state"), Some("false"));
        assert_eq!(resources.children[1].children[0].id(), Some("haproxy"));
    }

    #[test]
    fn test_descendants_in_document_order() {
        let root = Element::parse(r#"<a id="1"><b id="2"><c id="3"/></b><d id="4"/></a>"#).unwrap();
        let ids: Vec<_> = root.descendants().filter_map(Element::id).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_attribute_values_are_unescaped() {
        let root = Element::parse(r#"<nvpair name="cmd" value="a &amp;&amp; b"/>"#).unwrap();
        assert_eq!(root.attr("value"), Some("a && b"));
        assert_eq!(root.attr("missing"), None);
    }

    #[test]
    fn test_rejects_empty_input() {
        assert!(matches!(Element::parse(""), Err(XmlError::Empty)));
        assert!(matches!(Element::parse("   \n"), Err(XmlError::Empty)));
    }

    #[test]
    fn test_rejects_unclosed_element() {
        assert!(Element::parse("<cib><resources>").is_err());
    }

    #[test]
    fn test_rejects_mismatched_end_tag() {
        assert!(Element::parse("<cib><resources></cib>").is_err());
    }

    #[test]
    fn test_rejects_second_root() {
        assert!(matches!(
            Element::parse("<a/><b/>"),
            Err(XmlError::TrailingContent(name)) if name == "a"
        ));
    }

    #[test]
    fn test_rejects_non_xml_output() {
        assert!(Element::parse("Error: cluster is not currently running on this node").is_err());
    }
}
