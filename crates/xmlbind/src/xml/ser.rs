//! Document writing from an [`XmlElement`] tree using quick-xml.
//!
//! Text and attribute values are escaped here rather than by quick-xml so that
//! characters a parser would normalize (`\r` in text, `\r`/`\n`/`\t` in
//! attributes) are written as character references and read back unchanged.
//! Characters XML 1.0 cannot represent at all are an error.

use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::element::XmlElement;
use crate::error::{Error, Result};
use crate::xml::utils::NamespacePrefixes;

/// Writes `element` as a complete XML document string.
///
/// # Examples
///
/// ```
/// use xmlbind::{QName, XmlElement};
/// use xmlbind::xml::to_xml_string;
///
/// let mut root = XmlElement::new(QName::new(Some("urn:a"), "test"));
/// root.append_child(XmlElement::with_text(QName::local("city"), "a & b"));
/// let xml = to_xml_string(&root)?;
/// assert!(xml.contains(r#"<ns0:test xmlns:ns0="urn:a"><city>a &amp; b</city></ns0:test>"#));
/// # Ok::<(), xmlbind::Error>(())
/// ```
pub fn to_xml_string(element: &XmlElement) -> Result<String> {
    let buffer = to_xml_vec(element)?;
    String::from_utf8(buffer)
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Like [`to_xml_string`], indented by two spaces per level.
pub fn to_xml_string_pretty(element: &XmlElement) -> Result<String> {
    let mut buffer = Vec::new();
    let mut serializer = XmlSerializer::new(Writer::new_with_indent(&mut buffer, b' ', 2));
    serializer.write_document(element)?;
    String::from_utf8(buffer)
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Writes `element` as a complete XML document into a byte vector.
pub fn to_xml_vec(element: &XmlElement) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    to_xml_writer(element, &mut buffer)?;
    Ok(buffer)
}

/// Writes `element` as a complete XML document into `writer`.
pub fn to_xml_writer<W: Write>(element: &XmlElement, writer: W) -> Result<()> {
    XmlSerializer::new(Writer::new(writer)).write_document(element)
}

struct XmlSerializer<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> XmlSerializer<W> {
    fn new(writer: Writer<W>) -> Self {
        Self { writer }
    }

    fn write_document(&mut self, root: &XmlElement) -> Result<()> {
        let prefixes = NamespacePrefixes::collect(root);
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        self.write_element(root, &prefixes, true)
    }

    fn write_element(
        &mut self,
        element: &XmlElement,
        prefixes: &NamespacePrefixes,
        is_root: bool,
    ) -> Result<()> {
        let name = prefixes.qualify(&element.tag);
        let mut start = BytesStart::new(name.as_str());

        if is_root {
            for (uri, prefix) in prefixes.declarations() {
                let key = format!("xmlns:{}", prefix);
                start.push_attribute((key.as_str(), uri.as_str()));
            }
        }
        for (attr, value) in &element.attributes {
            let key = prefixes.qualify(attr);
            let value = escape(value, Context::Attribute, &element.tag.to_string())?;
            // Raw byte pairs are pushed without further escaping.
            start.push_attribute((key.as_bytes(), value.as_bytes()));
        }

        if element.children.is_empty() && element.text.is_none() {
            self.writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        self.writer.write_event(Event::Start(start))?;
        if let Some(text) = &element.text {
            let escaped = escape(text, Context::Text, &element.tag.to_string())?;
            self.writer
                .write_event(Event::Text(BytesText::from_escaped(escaped)))?;
        }
        for child in &element.children {
            self.write_element(child, prefixes, false)?;
        }
        self.writer
            .write_event(Event::End(BytesEnd::new(name.as_str())))?;
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Context {
    Text,
    Attribute,
}

/// Characters allowed by the XML 1.0 `Char` production.
fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

fn escape(raw: &str, context: Context, tag: &str) -> Result<String> {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            '"' if context == Context::Attribute => out.push_str("&quot;"),
            '\n' if context == Context::Attribute => out.push_str("&#10;"),
            '\t' if context == Context::Attribute => out.push_str("&#9;"),
            c if is_xml_char(c) => out.push(c),
            c => {
                return Err(Error::UnrepresentableChar {
                    tag: tag.to_string(),
                    character: c,
                });
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{QName, xsi_type};
    use crate::xml::from_xml_str;

    fn sample() -> XmlElement {
        let mut root = XmlElement::new(QName::local("test"));
        let atach = root.append_child(XmlElement::new(QName::new(Some("test_namespace"), "atach")));
        atach.set_attribute(xsi_type(), "Address");
        atach.append_child(XmlElement::with_text(
            QName::new(Some("test_namespace"), "street"),
            "123 <happy> way",
        ));
        atach.append_child(XmlElement::with_text(QName::new(Some("test_namespace"), "note"), ""));
        root
    }

    #[test]
    fn test_written_document_shape() {
        let xml = to_xml_string(&sample()).unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<test xmlns:ns0="test_namespace" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#));
        assert!(xml.contains(r#"<ns0:atach xsi:type="Address">"#));
        assert!(xml.contains("<ns0:street>123 &lt;happy&gt; way</ns0:street>"));
    }

    #[test]
    fn test_reparse_gives_same_tree() {
        let original = sample();
        let reparsed = from_xml_str(&to_xml_string(&original).unwrap()).unwrap();
        assert_eq!(reparsed.children[0].tag, original.children[0].tag);
        assert_eq!(reparsed.children[0].attributes, original.children[0].attributes);
        assert_eq!(reparsed.children[0].children[0], original.children[0].children[0]);
        // An empty text node is indistinguishable from no text once written.
        assert_eq!(reparsed.children[0].children[1].text, None);
    }

    #[test]
    fn test_line_breaks_survive_reparse() {
        let mut root = XmlElement::with_text(QName::local("r"), "x\r\ny\r");
        root.set_attribute(QName::local("note"), "a\r\n\tb \"c\"");

        let xml = to_xml_string(&root).unwrap();
        assert!(xml.contains("x&#13;\ny&#13;"));
        assert!(xml.contains(r#"note="a&#13;&#10;&#9;b &quot;c&quot;""#));

        let reparsed = from_xml_str(&xml).unwrap();
        assert_eq!(reparsed, root);
    }

    #[test]
    fn test_non_xml_characters_rejected() {
        let root = XmlElement::with_text(QName::local("r"), "bad\u{1}char");
        let err = to_xml_string(&root).unwrap_err();
        assert!(matches!(
            err,
            Error::UnrepresentableChar { character: '\u{1}', ref tag } if tag == "r"
        ));

        let mut root = XmlElement::new(QName::local("r"));
        root.set_attribute(QName::local("a"), "\u{FFFE}");
        assert!(to_xml_string(&root).is_err());
    }

    #[test]
    fn test_pretty_output_reparses() {
        let pretty = to_xml_string_pretty(&sample()).unwrap();
        assert!(pretty.contains('\n'));
        let reparsed = from_xml_str(&pretty).unwrap();
        assert_eq!(reparsed.children[0].children[0].text_content(), "123 <happy> way");
        assert_eq!(reparsed.text, None);
    }
}
