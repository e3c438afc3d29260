//! In-memory XML element tree exchanged with the transport layer.
//!
//! The binding engine only ever sees this structure: a qualified tag, ordered
//! attributes, ordered child elements and optional text. Turning bytes into a
//! tree (and back) lives in [`crate::xml`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// XML Schema instance namespace, home of the `type` attribute.
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// XML Schema namespace.
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// The reserved type-identifier attribute, `{XSI}type`.
pub fn xsi_type() -> QName {
    QName::new(Some(XSI_NAMESPACE), "type")
}

/// A namespace-qualified name.
///
/// Written and parsed in Clark notation: `{namespace}local`, or just `local`
/// when the name is not in a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QName {
    pub namespace: Option<String>,
    pub local: String,
}

impl QName {
    /// A name in `namespace`, or in no namespace for `None`.
    pub fn new(namespace: Option<&str>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            local: local.into(),
        }
    }

    /// A name with no namespace.
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local: local.into(),
        }
    }

    /// Same namespace, different local part.
    pub fn sibling(&self, local: impl Into<String>) -> Self {
        Self {
            namespace: self.namespace.clone(),
            local: local.into(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => f.write_str(&self.local),
        }
    }
}

impl FromStr for QName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidName(s.to_string());
        let (namespace, local) = match s.strip_prefix('{') {
            Some(rest) => {
                let (ns, local) = rest.split_once('}').ok_or_else(invalid)?;
                (Some(ns), local)
            }
            None => (None, s),
        };
        if local.is_empty() || local.contains(['{', '}']) {
            return Err(invalid());
        }
        Ok(QName::new(namespace.filter(|ns| !ns.is_empty()), local))
    }
}

impl TryFrom<String> for QName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<QName> for String {
    fn from(name: QName) -> Self {
        name.to_string()
    }
}

/// One XML element node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    pub tag: QName,
    pub attributes: Vec<(QName, String)>,
    pub children: Vec<XmlElement>,
    pub text: Option<String>,
}

impl Default for QName {
    fn default() -> Self {
        QName::local("")
    }
}

impl XmlElement {
    /// An empty element with no attributes, children or text.
    pub fn new(tag: QName) -> Self {
        Self {
            tag,
            ..Default::default()
        }
    }

    /// A leaf element holding only text.
    pub fn with_text(tag: QName, text: impl Into<String>) -> Self {
        Self {
            tag,
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Appends `child` and returns a handle to it.
    pub fn append_child(&mut self, child: XmlElement) -> &mut XmlElement {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Sets an attribute, replacing an existing one with the same qualified name.
    pub fn set_attribute(&mut self, name: QName, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Value of the attribute with this qualified name.
    pub fn attribute(&self, name: &QName) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Direct children whose local name matches, in document order.
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.tag.local == local)
    }

    /// All direct children, in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter()
    }

    /// Text content, empty when the element has none.
    pub fn text_content(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}
