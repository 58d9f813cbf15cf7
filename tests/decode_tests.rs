//! Decoding surface: value shapes, options and datatype coverage.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

use xsdkit::documents::Document;
use xsdkit::validators::schemas::Schema;
use xsdkit::{DecodeOptions, DecodeOutcome};

const ORDER_XSD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
    <xs:element name="order">
        <xs:complexType>
            <xs:sequence>
                <xs:element name="id" type="xs:int"/>
                <xs:element name="note" type="xs:string" minOccurs="0"/>
                <xs:element name="line" maxOccurs="unbounded">
                    <xs:complexType>
                        <xs:simpleContent>
                            <xs:extension base="xs:string">
                                <xs:attribute name="qty" type="xs:int" use="required"/>
                                <xs:attribute name="price" type="xs:decimal" use="required"/>
                            </xs:extension>
                        </xs:simpleContent>
                    </xs:complexType>
                </xs:element>
            </xs:sequence>
            <xs:attribute name="paid" type="xs:boolean" default="false"/>
        </xs:complexType>
    </xs:element>
</xs:schema>"#;

const ORDER_XML: &str = r#"<order paid="true">
    <id>1042</id>
    <line qty="2" price="9.95">widget</line>
    <line qty="1" price="0.5">gadget</line>
</order>"#;

#[test]
fn decoded_value_shape() {
    let schema = Schema::from_text(ORDER_XSD).unwrap();
    let value = schema
        .to_dict_str(ORDER_XML, None, DecodeOptions::default())
        .unwrap();

    assert_eq!(
        value,
        json!({
            "@paid": true,
            "id": 1042,
            "line": [
                {"@qty": 2, "@price": 9.95, "#": "widget"},
                {"@qty": 1, "@price": 0.5, "#": "gadget"}
            ]
        })
    );
}

#[test]
fn decode_is_lossless_over_the_instance_surface() {
    // Every element, attribute and text value of the instance appears in
    // the decoded tree with its type-normalized value
    let schema = Schema::from_text(ORDER_XSD).unwrap();
    let value = schema
        .to_dict_str(ORDER_XML, None, DecodeOptions::default())
        .unwrap();

    let body = value.as_object().unwrap();
    assert_eq!(body.len(), 3);
    let lines = body["line"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    for line in lines {
        let line = line.as_object().unwrap();
        assert!(line.contains_key("@qty"));
        assert!(line.contains_key("@price"));
        assert!(line.contains_key("#"));
    }
}

#[test]
fn attribute_default_fills_when_absent() {
    let schema = Schema::from_text(ORDER_XSD).unwrap();
    let xml = r#"<order><id>7</id><line qty="1" price="1.0">x</line></order>"#;

    let value = schema
        .to_dict_str(xml, None, DecodeOptions::default())
        .unwrap();
    assert_eq!(value["@paid"], json!(false));

    let bare = schema
        .to_dict_str(
            xml,
            None,
            DecodeOptions {
                use_defaults: false,
                ..DecodeOptions::default()
            },
        )
        .unwrap();
    assert!(bare.get("@paid").is_none());
}

#[test]
fn force_list_wraps_every_child_entry() {
    let schema = Schema::from_text(ORDER_XSD).unwrap();
    let value = schema
        .to_dict_str(
            ORDER_XML,
            None,
            DecodeOptions {
                force_list: true,
                ..DecodeOptions::default()
            },
        )
        .unwrap();

    // Every body entry backed by a child element declaration is a sequence
    assert!(value["id"].is_array());
    assert!(value["line"].is_array());
    assert_eq!(value["id"], json!([1042]));
    // Attributes are never wrapped
    assert_eq!(value["@paid"], json!(true));
}

#[test]
fn custom_text_key_and_attribute_prefix() {
    let schema = Schema::from_text(ORDER_XSD).unwrap();
    let value = schema
        .to_dict_str(
            r#"<order><id>1</id><line qty="1" price="2.0">thing</line></order>"#,
            None,
            DecodeOptions {
                text_key: "$text".to_string(),
                attribute_prefix: "$".to_string(),
                ..DecodeOptions::default()
            },
        )
        .unwrap();

    let line = &value["line"];
    assert_eq!(line["$qty"], json!(1));
    assert_eq!(line["$text"], json!("thing"));
}

#[test]
fn path_anchored_iteration_in_document_order() {
    let schema = Schema::from_text(ORDER_XSD).unwrap();
    let doc = Document::from_str(ORDER_XML).unwrap();

    let outcomes: Vec<DecodeOutcome> = schema
        .iter_decode(&doc, Some("/order/line"), DecodeOptions::default())
        .unwrap()
        .collect();

    let texts: Vec<&str> = outcomes
        .iter()
        .filter_map(|o| match o {
            DecodeOutcome::Value(v) => v["#"].as_str(),
            DecodeOutcome::Error(_) => None,
        })
        .collect();
    assert_eq!(texts, vec!["widget", "gadget"]);
}

#[test]
fn path_mismatch_yields_single_error() {
    let schema = Schema::from_text(ORDER_XSD).unwrap();
    let doc = Document::from_str(ORDER_XML).unwrap();

    let outcomes: Vec<DecodeOutcome> = schema
        .iter_decode(&doc, Some("/order/nothing"), DecodeOptions::default())
        .unwrap()
        .collect();
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(outcomes[0], DecodeOutcome::Error(_)));
}

#[test]
fn namespaced_decode_keys_use_prefixes() {
    let schema = Schema::from_text(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
               targetNamespace="urn:books" xmlns="urn:books"
               elementFormDefault="qualified">
            <xs:element name="book">
                <xs:complexType>
                    <xs:sequence>
                        <xs:element name="title" type="xs:string"/>
                    </xs:sequence>
                </xs:complexType>
            </xs:element>
        </xs:schema>"#,
    )
    .unwrap();

    // The instance's default namespace declaration collapses keys to
    // local names
    let value = schema
        .to_dict_str(
            r#"<book xmlns="urn:books"><title>Dune</title></book>"#,
            None,
            DecodeOptions::default(),
        )
        .unwrap();
    assert_eq!(value, json!({"title": "Dune"}));

    // A prefixed instance keeps the prefix in the decoded keys
    let value = schema
        .to_dict_str(
            r#"<b:book xmlns:b="urn:books"><b:title>Dune</b:title></b:book>"#,
            None,
            DecodeOptions::default(),
        )
        .unwrap();
    assert_eq!(value, json!({"b:title": "Dune"}));
}

#[test]
fn list_and_union_values_decode() {
    let schema = Schema::from_text(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:simpleType name="intList">
                <xs:list itemType="xs:int"/>
            </xs:simpleType>
            <xs:simpleType name="intOrKeyword">
                <xs:union memberTypes="xs:int">
                    <xs:simpleType>
                        <xs:restriction base="xs:token">
                            <xs:enumeration value="auto"/>
                        </xs:restriction>
                    </xs:simpleType>
                </xs:union>
            </xs:simpleType>
            <xs:element name="sizes" type="intList"/>
            <xs:element name="width" type="intOrKeyword"/>
        </xs:schema>"#,
    )
    .unwrap();

    assert_eq!(
        schema
            .to_dict_str("<sizes>1 2 3</sizes>", None, DecodeOptions::default())
            .unwrap(),
        json!([1, 2, 3])
    );

    assert_eq!(
        schema
            .to_dict_str("<width>42</width>", None, DecodeOptions::default())
            .unwrap(),
        json!(42)
    );
    assert_eq!(
        schema
            .to_dict_str("<width>auto</width>", None, DecodeOptions::default())
            .unwrap(),
        json!("auto")
    );
    assert!(!schema.is_valid_str("<width>wide</width>"));
}

#[test]
fn datatype_coverage() {
    let schema = Schema::from_text(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:element name="r">
                <xs:complexType>
                    <xs:sequence>
                        <xs:element name="flag" type="xs:boolean"/>
                        <xs:element name="when" type="xs:dateTime"/>
                        <xs:element name="amount" type="xs:decimal"/>
                        <xs:element name="ratio" type="xs:double"/>
                        <xs:element name="payload" type="xs:base64Binary"/>
                    </xs:sequence>
                </xs:complexType>
            </xs:element>
        </xs:schema>"#,
    )
    .unwrap();

    let xml = r#"<r>
        <flag>1</flag>
        <when>2016-03-01T12:00:00Z</when>
        <amount>10.50</amount>
        <ratio>0.25</ratio>
        <payload>aGk=</payload>
    </r>"#;

    let value = schema
        .to_dict_str(xml, None, DecodeOptions::default())
        .unwrap();
    assert_eq!(value["flag"], json!(true));
    assert_eq!(value["when"], json!("2016-03-01T12:00:00Z"));
    assert_eq!(value["amount"], json!(10.5));
    assert_eq!(value["ratio"], json!(0.25));
    assert_eq!(value["payload"], json!("6869"));
}

proptest! {
    // Derivation transitivity: any integer accepted by the restricted type
    // is accepted by its base chain
    #[test]
    fn restricted_int_is_transitive(n in -10000i64..10000) {
        let schema = Schema::from_text(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:simpleType name="narrow">
                    <xs:restriction base="wide">
                        <xs:minInclusive value="-100"/>
                        <xs:maxInclusive value="100"/>
                    </xs:restriction>
                </xs:simpleType>
                <xs:simpleType name="wide">
                    <xs:restriction base="xs:int">
                        <xs:minInclusive value="-5000"/>
                        <xs:maxInclusive value="5000"/>
                    </xs:restriction>
                </xs:simpleType>
                <xs:element name="narrowed" type="narrow"/>
                <xs:element name="widened" type="wide"/>
                <xs:element name="plain" type="xs:int"/>
            </xs:schema>"#,
        )
        .unwrap();

        let narrow = schema.is_valid_str(&format!("<narrowed>{}</narrowed>", n));
        let wide = schema.is_valid_str(&format!("<widened>{}</widened>", n));
        let plain = schema.is_valid_str(&format!("<plain>{}</plain>", n));

        prop_assert!(plain);
        if narrow {
            prop_assert!(wide);
        }
        prop_assert_eq!(narrow, (-100..=100).contains(&n));
        prop_assert_eq!(wide, (-5000..=5000).contains(&n));
    }

    // The decoded integer value round-trips the lexical form
    #[test]
    fn integer_decode_round_trip(n in any::<i32>()) {
        let schema = Schema::from_text(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="n" type="xs:int"/>
            </xs:schema>"#,
        )
        .unwrap();
        let value = schema
            .to_dict_str(&format!("<n>{}</n>", n), None, DecodeOptions::default())
            .unwrap();
        prop_assert_eq!(value, json!(n));
    }
}
