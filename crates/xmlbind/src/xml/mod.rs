//! XML document I/O.
//!
//! The binding engine works on [`XmlElement`] trees. This module moves those
//! trees in and out of text:
//!
//! - **Parsing**: `roxmltree` builds a read-only DOM with namespaces
//!   resolved, which is then copied into an owned [`XmlElement`] tree.
//! - **Writing**: quick-xml events are written straight from the tree. Every
//!   namespace used anywhere in the document is declared once on the root.
//!
//! ## Prefixes
//!
//! | Namespace | Prefix |
//! |-----------|--------|
//! | `http://www.w3.org/2001/XMLSchema-instance` | `xsi` |
//! | `http://www.w3.org/2001/XMLSchema` | `xsd` |
//! | anything else | `ns0`, `ns1`, ... in first-use order |
//!
//! Names without a namespace are written unprefixed.
//!
//! ## Examples
//!
//! ```
//! use xmlbind::{Instance, QName};
//! use xmlbind::schema::{FieldDef, SchemaBuilder, TypeDef};
//! use xmlbind::xml::{marshal_to_string, unmarshal_from_str};
//!
//! let schema = SchemaBuilder::new()
//!     .namespace("urn:test")
//!     .with_type(TypeDef::new("Address").field(FieldDef::required("city", "string")))
//!     .build()?;
//!
//! let mut address = schema.new_instance("Address")?;
//! address.set("city", "Springfield");
//!
//! let xml = marshal_to_string(&schema, &address, QName::new(Some("urn:test"), "address"))?;
//! let decoded: Instance = unmarshal_from_str(&schema, "Address", &xml)?;
//! assert_eq!(decoded, address);
//! # Ok::<(), xmlbind::Error>(())
//! ```

mod de;
mod ser;
mod utils;

pub use de::{from_xml_reader, from_xml_slice, from_xml_str};
pub use ser::{to_xml_string, to_xml_string_pretty, to_xml_vec, to_xml_writer};

use crate::element::{QName, XmlElement};
use crate::error::Result;
use crate::instance::Instance;
use crate::marshal::Marshaler;
use crate::schema::Schema;
use crate::unmarshal::Unmarshaler;

/// Marshals `instance` as the root element `tag` of a new document.
pub fn marshal_to_string(schema: &Schema, instance: &Instance, tag: QName) -> Result<String> {
    let root: XmlElement = Marshaler::new(schema).to_element(instance, tag)?;
    to_xml_string(&root)
}

/// Parses `xml` and decodes its root element as an instance of `type_name`.
pub fn unmarshal_from_str(schema: &Schema, type_name: &str, xml: &str) -> Result<Instance> {
    let root = from_xml_str(xml)?;
    Unmarshaler::new(schema).from_xml_named(type_name, &root)
}
