//! Document parsing into an [`XmlElement`] tree.
//!
//! Parsing goes through `roxmltree`, which resolves namespace prefixes and
//! entity references. Namespace declarations, comments and processing
//! instructions do not survive into the tree.

use std::io::Read;

use crate::element::{QName, XmlElement};
use crate::error::Result;

/// Parses an XML document and returns its root element.
///
/// # Examples
///
/// ```
/// use xmlbind::xml::from_xml_str;
///
/// let root = from_xml_str(r#"<a:test xmlns:a="urn:a"><city>x</city></a:test>"#)?;
/// assert_eq!(root.tag.to_string(), "{urn:a}test");
/// assert_eq!(root.children[0].text.as_deref(), Some("x"));
/// # Ok::<(), xmlbind::Error>(())
/// ```
pub fn from_xml_str(xml: &str) -> Result<XmlElement> {
    let document = roxmltree::Document::parse(xml)?;
    Ok(convert(document.root_element()))
}

/// Parses an XML document from bytes.
pub fn from_xml_slice(xml: &[u8]) -> Result<XmlElement> {
    let xml = std::str::from_utf8(xml)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    from_xml_str(xml)
}

/// Parses an XML document from a reader.
pub fn from_xml_reader<R: Read>(mut reader: R) -> Result<XmlElement> {
    let mut xml = String::new();
    reader.read_to_string(&mut xml)?;
    from_xml_str(&xml)
}

fn convert(node: roxmltree::Node<'_, '_>) -> XmlElement {
    let tag_name = node.tag_name();
    let mut element = XmlElement::new(QName::new(tag_name.namespace(), tag_name.name()));

    element.attributes = node
        .attributes()
        .map(|attr| (QName::new(attr.namespace(), attr.name()), attr.value().to_string()))
        .collect();

    let mut text = String::new();
    for child in node.children() {
        if child.is_element() {
            element.children.push(convert(child));
        } else if child.is_text() {
            text.push_str(child.text().unwrap_or_default());
        }
    }

    // Indentation between child elements is not content.
    let keep = if element.children.is_empty() {
        !text.is_empty()
    } else {
        !is_whitespace_text(&text)
    };
    if keep {
        element.text = Some(text);
    }
    element
}

fn is_whitespace_text(text: &str) -> bool {
    text.chars().all(|c| matches!(c, ' ' | '\n' | '\r' | '\t'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::xsi_type;

    #[test]
    fn test_namespaces_and_attributes_resolved() {
        let xml = r#"<?xml version="1.0"?>
<test xmlns:ns0="test_namespace" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <!-- comment -->
  <ns0:atach xsi:type="Address">
    <ns0:street>123 happy way</ns0:street>
    <ns0:zip> 32 </ns0:zip>
  </ns0:atach>
</test>"#;
        let root = from_xml_str(xml).unwrap();
        assert_eq!(root.tag, QName::local("test"));
        assert!(root.attributes.is_empty());
        assert_eq!(root.text, None);

        let atach = &root.children[0];
        assert_eq!(atach.tag, QName::new(Some("test_namespace"), "atach"));
        assert_eq!(atach.attribute(&xsi_type()), Some("Address"));
        assert_eq!(atach.children.len(), 2);
        assert_eq!(atach.children[0].text.as_deref(), Some("123 happy way"));
        assert_eq!(atach.children[1].text.as_deref(), Some(" 32 "));
    }

    #[test]
    fn test_entities_and_empty_leaves() {
        let root = from_xml_str("<r><a>x &amp; y &lt;z&gt;</a><b/><c></c></r>").unwrap();
        assert_eq!(root.children[0].text.as_deref(), Some("x & y <z>"));
        assert_eq!(root.children[1].text, None);
        assert_eq!(root.children[2].text, None);
    }

    #[test]
    fn test_malformed_document() {
        assert!(from_xml_str("<r><a></r>").is_err());
        assert!(from_xml_slice(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn test_reader() {
        let root = from_xml_reader("<r><a>1</a></r>".as_bytes()).unwrap();
        assert_eq!(root.children[0].text_content(), "1");
    }
}
