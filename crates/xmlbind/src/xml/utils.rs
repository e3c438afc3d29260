//! Namespace prefix bookkeeping for document writing.
//!
//! Prefixes are assigned in first-use order over a pre-order walk of the
//! tree, so the same tree always produces the same document. All
//! declarations go on the root element; no attempt is made to minimize them.

use std::collections::HashMap;

use crate::element::{QName, XSD_NAMESPACE, XSI_NAMESPACE, XmlElement};

/// Namespace URI → prefix table for one document.
#[derive(Debug, Default)]
pub(crate) struct NamespacePrefixes {
    declarations: Vec<(String, String)>,
    by_uri: HashMap<String, usize>,
    generated: usize,
}

impl NamespacePrefixes {
    /// Collects every namespace used by tags and attributes in `root`.
    pub(crate) fn collect(root: &XmlElement) -> Self {
        let mut prefixes = Self::default();
        let mut stack = vec![root];
        while let Some(element) = stack.pop() {
            prefixes.note(&element.tag);
            for (name, _) in &element.attributes {
                prefixes.note(name);
            }
            stack.extend(element.children.iter().rev());
        }
        prefixes
    }

    fn note(&mut self, name: &QName) {
        let Some(uri) = name.namespace.as_deref() else {
            return;
        };
        if self.by_uri.contains_key(uri) {
            return;
        }
        let prefix = match uri {
            XSI_NAMESPACE => "xsi".to_string(),
            XSD_NAMESPACE => "xsd".to_string(),
            _ => {
                let prefix = format!("ns{}", self.generated);
                self.generated += 1;
                prefix
            }
        };
        self.by_uri.insert(uri.to_string(), self.declarations.len());
        self.declarations.push((uri.to_string(), prefix));
    }

    /// `prefix:local`, or just `local` for names outside any namespace.
    pub(crate) fn qualify(&self, name: &QName) -> String {
        match name
            .namespace
            .as_deref()
            .and_then(|uri| self.by_uri.get(uri))
        {
            Some(&index) => format!("{}:{}", self.declarations[index].1, name.local),
            None => name.local.clone(),
        }
    }

    /// `(uri, prefix)` pairs in assignment order.
    pub(crate) fn declarations(&self) -> &[(String, String)] {
        &self.declarations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::xsi_type;

    #[test]
    fn test_prefixes_in_first_use_order() {
        let mut root = XmlElement::new(QName::local("test"));
        let child = root.append_child(XmlElement::new(QName::new(Some("urn:a"), "atach")));
        child.set_attribute(xsi_type(), "Address");
        child.append_child(XmlElement::with_text(QName::new(Some("urn:b"), "street"), "x"));
        child.append_child(XmlElement::with_text(QName::new(Some("urn:a"), "city"), "y"));

        let prefixes = NamespacePrefixes::collect(&root);
        let prefixes_only: Vec<_> = prefixes
            .declarations()
            .iter()
            .map(|(_, p)| p.as_str())
            .collect();
        assert_eq!(prefixes_only, ["ns0", "xsi", "ns1"]);
        assert_eq!(prefixes.qualify(&QName::new(Some("urn:b"), "street")), "ns1:street");
        assert_eq!(prefixes.qualify(&xsi_type()), "xsi:type");
        assert_eq!(prefixes.qualify(&QName::local("test")), "test");
    }
}
