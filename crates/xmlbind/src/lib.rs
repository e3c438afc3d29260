//! # xmlbind
//!
//! Declarative XML data binding. Record types are described at runtime by
//! type descriptors, and instances move between memory and XML element trees
//! without any per-type code.
//!
//! ## Features
//!
//! - **Type descriptors**: named fields with element types and occurrence
//!   bounds, single-parent inheritance, built once into an immutable
//!   [`Schema`]. Descriptors can also be loaded from JSON.
//! - **Marshaling**: [`Marshaler`] walks an [`Instance`] and writes one child
//!   element per present value, inherited fields first.
//! - **Unmarshaling**: [`Unmarshaler`] enforces minimum and maximum
//!   occurrences and decodes scalar text through the [`codec`].
//! - **Polymorphism**: [`TypeRegistry`] and [`resolve_and_decode`] pick the
//!   concrete type of an "any type" payload from its `xsi:type` attribute.
//! - **Documents** (feature `xml`, on by default): parse and write whole XML
//!   documents with namespace prefixes handled for you.
//!
//! ## Primitive mapping
//!
//! | Field type | Rust value | Text form |
//! |------------|------------|-----------|
//! | `string` | `String` | verbatim |
//! | `integer` | `i64` | `-42` |
//! | `double` | `f64` | `0.3333333333333333`, `INF`, `NaN` |
//! | `boolean` | `bool` | `true`, `false`, `1`, `0` |
//! | `timestamp` | `chrono::NaiveDateTime` | `2024-01-02T03:04:05` |
//!
//! ## Examples
//!
//! ```
//! use xmlbind::{Marshaler, QName, Unmarshaler, XmlElement};
//! use xmlbind::schema::{FieldDef, SchemaBuilder, TypeDef};
//!
//! let schema = SchemaBuilder::new()
//!     .namespace("urn:people")
//!     .with_type(TypeDef::new("Person").field(FieldDef::optional("name", "string")))
//!     .with_type(
//!         TypeDef::new("Employee")
//!             .extends("Person")
//!             .field(FieldDef::required("id", "integer")),
//!     )
//!     .build()?;
//!
//! let mut employee = schema.new_instance("Employee")?;
//! employee.set("name", "Ann").set("id", 7);
//!
//! let mut root = XmlElement::new(QName::local("test"));
//! let element = Marshaler::new(&schema).to_xml(&employee, &mut root, QName::local("emp"))?;
//! assert_eq!(element.children[0].tag.local, "name");
//!
//! let decoded = Unmarshaler::new(&schema).from_xml_named("Employee", &root.children[0])?;
//! assert_eq!(decoded, employee);
//! # Ok::<(), xmlbind::Error>(())
//! ```

pub mod codec;
pub mod config;
pub mod element;
pub mod error;
pub mod instance;
pub mod marshal;
pub mod registry;
pub mod schema;
pub mod unmarshal;

#[cfg(feature = "xml")]
pub mod xml;

// Re-export common types and functions
pub use codec::{PrimitiveKind, Scalar};
pub use config::{BindOptions, DuplicatePolicy, UnknownChildPolicy, ZeroOccurrencePolicy};
pub use element::{QName, XSD_NAMESPACE, XSI_NAMESPACE, XmlElement, xsi_type};
pub use error::{Error, MarshalError, Result, ScalarError, SchemaError};
pub use instance::{FieldValue, Instance, Value};
pub use marshal::Marshaler;
pub use registry::{TypeRegistry, resolve_and_decode, tag_concrete_type};
pub use schema::{
    FieldDef, FieldDescriptor, MaxOccurs, Occurs, Schema, SchemaBuilder, TypeDef, TypeDescriptor,
    TypeId, TypeRef,
};
pub use unmarshal::Unmarshaler;
