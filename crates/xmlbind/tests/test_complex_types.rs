use std::sync::Arc;

use chrono::NaiveDate;
use xmlbind::schema::{FieldDef, SchemaBuilder, TypeDef};
use xmlbind::{
    Error, FieldValue, Instance, Marshaler, MaxOccurs, QName, Result, Schema, TypeRegistry,
    Unmarshaler, Value, XmlElement, resolve_and_decode, tag_concrete_type,
};

const NS: &str = "test_namespace";

fn test_schema() -> Schema {
    SchemaBuilder::new()
        .namespace(NS)
        .with_type(
            TypeDef::new("Address")
                .doc("an address info")
                .field(FieldDef::required("street", "string"))
                .field(FieldDef::required("city", "string"))
                .field(FieldDef::required("zip", "integer"))
                .field(FieldDef::optional("since", "dateTime"))
                .field(FieldDef::required("latitude", "double"))
                .field(FieldDef::required("longitude", "double")),
        )
        .with_type(
            TypeDef::new("Person")
                .doc("a person info")
                .field(FieldDef::optional("name", "string"))
                .field(FieldDef::optional("birthdate", "dateTime"))
                .field(FieldDef::optional("age", "integer"))
                .field(FieldDef::repeated("addresses", "Address"))
                .field(FieldDef::repeated("titles", "string")),
        )
        .with_type(
            TypeDef::new("Employee")
                .extends("Person")
                .doc("an employee info")
                .field(FieldDef::required("id", "integer"))
                .field(FieldDef::required("salary", "double")),
        )
        .with_type(
            TypeDef::new("Level2")
                .field(FieldDef::required("arg1", "string"))
                .field(FieldDef::required("arg2", "double")),
        )
        .with_type(TypeDef::new("Level3").field(FieldDef::required("arg1", "integer")))
        .with_type(TypeDef::new("Level4").field(FieldDef::required("arg1", "string")))
        .with_type(
            TypeDef::new("Level1")
                .field(FieldDef::required("level2", "Level2"))
                .field(FieldDef::repeated("level3", "Level3"))
                .field(FieldDef::repeated("level4", "Level4")),
        )
        .build()
        .expect("fixture schema builds")
}

fn atach() -> QName {
    QName::new(Some(NS), "atach")
}

fn address(schema: &Schema) -> Result<Instance> {
    let mut a = schema.new_instance("Address")?;
    a.set("street", "123 happy way")
        .set("city", "badtown")
        .set("zip", 32)
        .set("latitude", 4.3)
        .set("longitude", 88.0);
    Ok(a)
}

/// Marshals under a fresh `test` root and returns the wrapper, as callers of
/// `to_xml` see it.
fn marshal_under_root(schema: &Schema, instance: &Instance) -> Result<XmlElement> {
    let mut root = XmlElement::new(QName::local("test"));
    Marshaler::new(schema).to_xml(instance, &mut root, atach())?;
    assert_eq!(root.children.len(), 1);
    Ok(root.children.remove(0))
}

#[test]
fn test_simple_class() -> Result<()> {
    let schema = test_schema();
    let a = address(&schema)?;

    let element = marshal_under_root(&schema, &a)?;
    assert_eq!(element.tag, atach());
    assert_eq!(element.children.len(), 5);
    assert!(element.children.iter().all(|c| c.tag.namespace.as_deref() == Some(NS)));

    let r = Unmarshaler::new(&schema).from_xml_named("Address", &element)?;
    assert_eq!(r.text("street"), Some("123 happy way"));
    assert_eq!(r.text("city"), Some("badtown"));
    assert_eq!(r.integer("zip"), Some(32));
    assert_eq!(r.double("latitude"), Some(4.3));
    assert_eq!(r.double("longitude"), Some(88.0));
    assert!(r.is_absent("since"));
    assert_eq!(r, a);
    Ok(())
}

#[test]
fn test_nested_class_all_absent() -> Result<()> {
    let schema = test_schema();
    let p = schema.new_instance("Person")?;

    let element = marshal_under_root(&schema, &p)?;
    assert!(element.children.is_empty());
    assert_eq!(element.text, None);

    let r = Unmarshaler::new(&schema).from_xml_named("Person", &element)?;
    for field in ["name", "birthdate", "age", "addresses", "titles"] {
        assert!(r.is_absent(field), "{field} should be absent");
    }
    Ok(())
}

#[test]
fn test_complex_class() -> Result<()> {
    let schema = test_schema();
    let mut level2 = schema.new_instance("Level2")?;
    level2.set("arg1", "abcd").set("arg2", 1.0 / 3.0);

    let mut l = schema.new_instance("Level1")?;
    l.set("level2", level2);
    for i in 0..100 {
        let mut item = schema.new_instance("Level3")?;
        item.set("arg1", i);
        l.push("level3", item);
    }
    for i in 0..4 {
        let mut item = schema.new_instance("Level4")?;
        item.set("arg1", i.to_string());
        l.push("level4", item);
    }

    let element = marshal_under_root(&schema, &l)?;
    assert_eq!(element.children.len(), 1 + 100 + 4);

    let l1 = Unmarshaler::new(&schema).from_xml_named("Level1", &element)?;
    let level2 = l1.nested("level2").expect("level2 present");
    assert_eq!(level2.text("arg1"), Some("abcd"));
    assert_eq!(level2.double("arg2"), Some(1.0 / 3.0));

    let level3 = l1.sequence("level3").expect("level3 present");
    assert_eq!(level3.len(), 100);
    for (i, item) in level3.iter().enumerate() {
        let item = item.as_instance().expect("nested record");
        assert_eq!(item.integer("arg1"), Some(i as i64));
    }

    let level4 = l1.sequence("level4").expect("level4 present");
    assert_eq!(level4.len(), 4);
    for (i, item) in level4.iter().enumerate() {
        assert_eq!(item.as_instance().and_then(|x| x.text("arg1")), Some(i.to_string().as_str()));
    }

    assert_eq!(l1, l);
    Ok(())
}

#[test]
fn test_any() -> Result<()> {
    let schema = Arc::new(test_schema());
    let a = address(&schema)?;

    let mut element = marshal_under_root(&schema, &a)?;
    tag_concrete_type(&mut element, "Address");

    let registry = TypeRegistry::new(schema.clone());
    for name in ["Person", "Address", "Level4", "Level3", "Level2", "Level1"] {
        registry.register_type(name)?;
    }

    let r = resolve_and_decode(&element, &registry)?;
    assert_eq!(r.type_name(), "Address");
    assert_eq!(r.type_id(), schema.require("Address")?.id);
    assert_eq!(r, a);
    Ok(())
}

#[test]
fn test_any_unknown_type() -> Result<()> {
    let schema = Arc::new(test_schema());
    let mut element = marshal_under_root(&schema, &address(&schema)?)?;
    tag_concrete_type(&mut element, "Bogus");

    let registry = TypeRegistry::with_all_types(schema);
    let err = resolve_and_decode(&element, &registry).unwrap_err();
    assert!(matches!(err, Error::UnknownType { ref name } if name == "Bogus"));
    Ok(())
}

#[test]
fn test_inheritance_field_order() -> Result<()> {
    let schema = test_schema();
    let employee = schema.require("Employee")?;
    let names: Vec<&str> = employee.effective_fields().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        ["name", "birthdate", "age", "addresses", "titles", "id", "salary"]
    );

    let mut e = schema.new_instance("Employee")?;
    e.set("salary", 1000.5).set("id", 9).set("name", "Ann").push("titles", "Dr");
    let element = Marshaler::new(&schema).to_element(&e, atach())?;
    let tags: Vec<&str> = element.children.iter().map(|c| c.tag.local.as_str()).collect();
    assert_eq!(tags, ["name", "titles", "id", "salary"]);

    let decoded = Unmarshaler::new(&schema).from_xml_named("Employee", &element)?;
    assert_eq!(decoded, e);
    Ok(())
}

#[test]
fn test_missing_required_field() -> Result<()> {
    let schema = test_schema();
    let mut element = marshal_under_root(&schema, &address(&schema)?)?;
    element.children.retain(|c| c.tag.local != "zip");

    let err = Unmarshaler::new(&schema)
        .from_xml_named("Address", &element)
        .unwrap_err();
    match err {
        Error::MissingRequiredField { type_name, field, path } => {
            assert_eq!(type_name, "Address");
            assert_eq!(field, "zip");
            assert_eq!(path, "atach");
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[test]
fn test_duplicate_singular_field() -> Result<()> {
    let schema = test_schema();
    let mut element = marshal_under_root(&schema, &address(&schema)?)?;
    element.append_child(XmlElement::with_text(QName::new(Some(NS), "city"), "elsewhere"));

    let err = Unmarshaler::new(&schema)
        .from_xml_named("Address", &element)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::CardinalityViolation {
            ref field,
            max: MaxOccurs::One,
            found: 2,
            ..
        } if field == "city"
    ));
    Ok(())
}

#[test]
fn test_malformed_nested_scalar_reports_path() -> Result<()> {
    let schema = test_schema();
    let mut person = schema.new_instance("Person")?;
    person.push("addresses", address(&schema)?);
    person.push("addresses", address(&schema)?);

    let mut element = marshal_under_root(&schema, &person)?;
    let zip = element.children[1]
        .children
        .iter_mut()
        .find(|c| c.tag.local == "zip")
        .expect("zip written");
    zip.text = Some("thirty-two".to_string());

    let err = Unmarshaler::new(&schema)
        .from_xml_named("Person", &element)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::MalformedScalar { ref path, .. } if path == "atach/addresses[1]/zip"
    ));
    Ok(())
}

#[test]
fn test_round_trip_with_timestamps_and_sequences() -> Result<()> {
    let schema = test_schema();
    let born = NaiveDate::from_ymd_opt(1974, 12, 25)
        .and_then(|d| d.and_hms_milli_opt(8, 30, 0, 250))
        .expect("valid date");

    let mut a = address(&schema)?;
    a.set("since", born);

    let mut p = schema.new_instance("Employee")?;
    p.set("name", "Ann")
        .set("birthdate", born)
        .set("age", 50)
        .set_sequence("addresses", [a.clone(), a])
        .set_sequence("titles", ["Dr", " spaced "])
        .set("id", -1)
        .set("salary", f64::INFINITY);

    let element = Marshaler::new(&schema).to_element(&p, atach())?;
    let decoded = Unmarshaler::new(&schema).from_xml_named("Employee", &element)?;
    assert_eq!(decoded, p);
    assert_eq!(decoded.timestamp("birthdate"), Some(born));
    assert_eq!(decoded.sequence("titles").and_then(|t| t[1].as_str()), Some(" spaced "));
    Ok(())
}

#[test]
fn test_empty_sequence_decodes_as_absent() -> Result<()> {
    let schema = test_schema();
    let mut p = schema.new_instance("Person")?;
    p.set_sequence("titles", Vec::<Value>::new());
    assert!(matches!(p.get("titles"), Some(FieldValue::Sequence(items)) if items.is_empty()));

    let element = Marshaler::new(&schema).to_element(&p, atach())?;
    assert!(element.children.is_empty());

    let decoded = Unmarshaler::new(&schema).from_xml_named("Person", &element)?;
    assert!(decoded.is_absent("titles"));
    Ok(())
}

#[test]
fn test_nested_employee_in_person_slot() -> Result<()> {
    let schema = SchemaBuilder::new()
        .namespace(NS)
        .with_type(TypeDef::new("Person").field(FieldDef::optional("name", "string")))
        .with_type(
            TypeDef::new("Employee")
                .extends("Person")
                .field(FieldDef::required("id", "integer")),
        )
        .with_type(TypeDef::new("Team").field(FieldDef::repeated("members", "Person")))
        .build()?;

    let mut boss = schema.new_instance("Employee")?;
    boss.set("id", 1);
    let mut plain = schema.new_instance("Person")?;
    plain.set("name", "Bob");
    let mut team = schema.new_instance("Team")?;
    team.push("members", boss).push("members", plain);

    let element = Marshaler::new(&schema).to_element(&team, atach())?;
    let decoded = Unmarshaler::new(&schema).from_xml_named("Team", &element)?;
    let members = decoded.sequence("members").expect("members present");
    assert_eq!(members[0].as_instance().map(Instance::type_name), Some("Employee"));
    assert_eq!(members[1].as_instance().map(Instance::type_name), Some("Person"));
    assert_eq!(decoded, team);
    Ok(())
}
