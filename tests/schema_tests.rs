//! End-to-end schema compilation and validation scenarios.

use std::fs;

use xsdkit::namespaces::QName;
use xsdkit::validators::schemas::Schema;
use xsdkit::{DecodeOptions, Error};

#[test]
fn scenario_simple_element_decode() {
    let schema = Schema::from_text(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:element name="root" type="xs:int"/>
        </xs:schema>"#,
    )
    .unwrap();

    let value = schema
        .to_dict_str("<root>42</root>", None, DecodeOptions::default())
        .unwrap();
    assert_eq!(value, serde_json::json!(42));
}

#[test]
fn scenario_facet_violation() {
    let schema = Schema::from_text(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:element name="tag">
                <xs:simpleType>
                    <xs:restriction base="xs:string">
                        <xs:maxLength value="3"/>
                    </xs:restriction>
                </xs:simpleType>
            </xs:element>
        </xs:schema>"#,
    )
    .unwrap();

    assert!(schema.is_valid_str("<tag>abc</tag>"));
    assert!(!schema.is_valid_str("<tag>abcd</tag>"));
}

#[test]
fn scenario_chameleon_include() {
    let dir = tempfile::tempdir().unwrap();
    let included = dir.path().join("b.xsd");
    fs::write(
        &included,
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:element name="b" type="xs:string"/>
        </xs:schema>"#,
    )
    .unwrap();

    let including = dir.path().join("a.xsd");
    fs::write(
        &including,
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
               targetNamespace="urn:x" xmlns="urn:x" elementFormDefault="qualified">
            <xs:include schemaLocation="b.xsd"/>
            <xs:element name="a">
                <xs:complexType>
                    <xs:sequence>
                        <xs:element ref="b"/>
                    </xs:sequence>
                </xs:complexType>
            </xs:element>
        </xs:schema>"#,
    )
    .unwrap();

    let schema = Schema::from_file(&including).unwrap();

    // The included declarations adopt the including target namespace
    assert!(schema
        .maps()
        .lookup_element(&QName::namespaced("urn:x", "b"))
        .is_some());
    assert!(schema.maps().lookup_element(&QName::local("b")).is_none());

    assert!(schema.is_valid_str("<a xmlns=\"urn:x\"><b>text</b></a>"));
}

#[test]
fn include_of_mismatched_namespace_fails() {
    let dir = tempfile::tempdir().unwrap();
    let included = dir.path().join("other.xsd");
    fs::write(
        &included,
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
               targetNamespace="urn:other"/>"#,
    )
    .unwrap();

    let including = dir.path().join("main.xsd");
    fs::write(
        &including,
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
               targetNamespace="urn:x">
            <xs:include schemaLocation="other.xsd"/>
        </xs:schema>"#,
    )
    .unwrap();

    let error = Schema::from_file(&including).unwrap_err();
    match error {
        Error::Parse(e) => {
            // The failing include site is named in the wrapped error
            let text = format!("{}", e);
            assert!(text.contains("other.xsd"), "unexpected error: {}", text);
        }
        other => panic!("expected a parse error, got {:?}", other),
    }
}

#[test]
fn import_across_namespaces() {
    let dir = tempfile::tempdir().unwrap();
    let imported = dir.path().join("parts.xsd");
    fs::write(
        &imported,
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
               targetNamespace="urn:parts" elementFormDefault="qualified">
            <xs:element name="part" type="xs:string"/>
        </xs:schema>"#,
    )
    .unwrap();

    let main = dir.path().join("assembly.xsd");
    fs::write(
        &main,
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
               xmlns:p="urn:parts" targetNamespace="urn:asm"
               elementFormDefault="qualified">
            <xs:import namespace="urn:parts" schemaLocation="parts.xsd"/>
            <xs:element name="assembly">
                <xs:complexType>
                    <xs:sequence>
                        <xs:element ref="p:part" maxOccurs="unbounded"/>
                    </xs:sequence>
                </xs:complexType>
            </xs:element>
        </xs:schema>"#,
    )
    .unwrap();

    let schema = Schema::from_file(&main).unwrap();
    assert!(schema
        .maps()
        .lookup_element(&QName::namespaced("urn:parts", "part"))
        .is_some());

    let valid = r#"<assembly xmlns="urn:asm" xmlns:p="urn:parts">
        <p:part>bolt</p:part>
        <p:part>nut</p:part>
    </assembly>"#;
    assert!(schema.is_valid_str(valid));
}

#[test]
fn missing_include_location_is_a_resource_error() {
    let error = Schema::from_text(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
               targetNamespace="urn:x">
            <xs:include schemaLocation="/nonexistent/nowhere.xsd"/>
        </xs:schema>"#,
    )
    .unwrap_err();
    assert!(matches!(error, Error::Url(_)));
}

#[test]
fn redefine_overrides_declarations() {
    let dir = tempfile::tempdir().unwrap();
    let original = dir.path().join("base.xsd");
    fs::write(
        &original,
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
               targetNamespace="urn:r" xmlns="urn:r">
            <xs:simpleType name="codeType">
                <xs:restriction base="xs:string">
                    <xs:maxLength value="10"/>
                </xs:restriction>
            </xs:simpleType>
            <xs:element name="code" type="codeType"/>
        </xs:schema>"#,
    )
    .unwrap();

    let redefining = dir.path().join("strict.xsd");
    fs::write(
        &redefining,
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
               targetNamespace="urn:r" xmlns="urn:r">
            <xs:redefine schemaLocation="base.xsd">
                <xs:simpleType name="codeType">
                    <xs:restriction base="xs:string">
                        <xs:maxLength value="3"/>
                    </xs:restriction>
                </xs:simpleType>
            </xs:redefine>
        </xs:schema>"#,
    )
    .unwrap();

    let schema = Schema::from_file(&redefining).unwrap();
    assert!(schema.is_valid_str("<code xmlns=\"urn:r\">abc</code>"));
    assert!(!schema.is_valid_str("<code xmlns=\"urn:r\">abcdefgh</code>"));
}

#[test]
fn scenario_cyclic_type() {
    let schema = Schema::from_text(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:element name="Node" type="NodeType"/>
            <xs:complexType name="NodeType">
                <xs:sequence>
                    <xs:element name="Node" type="NodeType" minOccurs="0"/>
                </xs:sequence>
            </xs:complexType>
        </xs:schema>"#,
    )
    .unwrap();

    assert!(schema.is_valid_str("<Node><Node><Node/></Node></Node>"));
}

const SUBSTITUTION_XSD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
    <xs:element name="shape" type="xs:string"/>
    <xs:element name="circle" substitutionGroup="shape" type="xs:string"/>
    <xs:element name="ghost" substitutionGroup="shape" type="xs:string" abstract="true"/>
    <xs:element name="drawing">
        <xs:complexType>
            <xs:sequence>
                <xs:element ref="shape" maxOccurs="unbounded"/>
            </xs:sequence>
        </xs:complexType>
    </xs:element>
</xs:schema>"#;

#[test]
fn substitution_group_soundness() {
    let schema = Schema::from_text(SUBSTITUTION_XSD).unwrap();

    // The head and any non-abstract member are accepted in head position
    assert!(schema.is_valid_str("<drawing><shape>s</shape></drawing>"));
    assert!(schema.is_valid_str("<drawing><circle>c</circle></drawing>"));
    assert!(schema.is_valid_str(
        "<drawing><shape>s</shape><circle>c</circle></drawing>"
    ));

    // An abstract member is rejected
    assert!(!schema.is_valid_str("<drawing><ghost>g</ghost></drawing>"));

    // An unrelated element is rejected
    assert!(!schema.is_valid_str("<drawing><square>q</square></drawing>"));
}

#[test]
fn blocked_substitution_is_rejected() {
    let schema = Schema::from_text(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:element name="shape" type="xs:string" block="substitution"/>
            <xs:element name="circle" substitutionGroup="shape" type="xs:string"/>
            <xs:element name="drawing">
                <xs:complexType>
                    <xs:sequence>
                        <xs:element ref="shape"/>
                    </xs:sequence>
                </xs:complexType>
            </xs:element>
        </xs:schema>"#,
    )
    .unwrap();

    assert!(schema.is_valid_str("<drawing><shape>s</shape></drawing>"));
    assert!(!schema.is_valid_str("<drawing><circle>c</circle></drawing>"));
}

#[test]
fn xsi_type_substitution() {
    let schema = Schema::from_text(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:complexType name="baseType">
                <xs:attribute name="a" type="xs:string"/>
            </xs:complexType>
            <xs:complexType name="extendedType">
                <xs:complexContent>
                    <xs:extension base="baseType">
                        <xs:attribute name="b" type="xs:string"/>
                    </xs:extension>
                </xs:complexContent>
            </xs:complexType>
            <xs:element name="item" type="baseType"/>
        </xs:schema>"#,
    )
    .unwrap();

    // Without the override the extended attribute is refused
    assert!(!schema.is_valid_str("<item a=\"1\" b=\"2\"/>"));

    let overridden = r#"<item xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
        xsi:type="extendedType" a="1" b="2"/>"#;
    assert!(schema.is_valid_str(overridden));

    let unknown = r#"<item xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
        xsi:type="nosuchType"/>"#;
    assert!(!schema.is_valid_str(unknown));
}

#[test]
fn xsi_type_blocked_by_element() {
    let schema = Schema::from_text(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:complexType name="baseType">
                <xs:attribute name="a" type="xs:string"/>
            </xs:complexType>
            <xs:complexType name="extendedType">
                <xs:complexContent>
                    <xs:extension base="baseType">
                        <xs:attribute name="b" type="xs:string"/>
                    </xs:extension>
                </xs:complexContent>
            </xs:complexType>
            <xs:element name="item" type="baseType" block="extension"/>
        </xs:schema>"#,
    )
    .unwrap();

    let overridden = r#"<item xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
        xsi:type="extendedType" a="1" b="2"/>"#;
    assert!(!schema.is_valid_str(overridden));
}

#[test]
fn scenario_nillable_contract() {
    let schema = Schema::from_text(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:element name="qty" type="xs:int" nillable="true"/>
        </xs:schema>"#,
    )
    .unwrap();

    let nil = r#"<qty xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:nil="true"/>"#;
    assert!(schema.is_valid_str(nil));

    let nil_with_text =
        r#"<qty xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:nil="true">3</qty>"#;
    assert!(!schema.is_valid_str(nil_with_text));
}

#[test]
fn wildcard_content_with_process_contents() {
    let schema = Schema::from_text(
        r###"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
               targetNamespace="urn:w" xmlns="urn:w" elementFormDefault="qualified">
            <xs:element name="envelope">
                <xs:complexType>
                    <xs:sequence>
                        <xs:any namespace="##other" processContents="skip"
                                minOccurs="0" maxOccurs="unbounded"/>
                    </xs:sequence>
                </xs:complexType>
            </xs:element>
        </xs:schema>"###,
    )
    .unwrap();

    // Foreign content is accepted unchecked
    assert!(schema.is_valid_str(
        "<envelope xmlns=\"urn:w\"><x:any xmlns:x=\"urn:other\">?</x:any></envelope>"
    ));
    // Content from the target namespace does not satisfy ##other
    assert!(!schema.is_valid_str(
        "<envelope xmlns=\"urn:w\"><local>?</local></envelope>"
    ));
}

#[test]
fn validate_raises_first_error() {
    let schema = Schema::from_text(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:element name="n" type="xs:int"/>
        </xs:schema>"#,
    )
    .unwrap();

    let doc = xsdkit::documents::Document::from_str("<n>abc</n>").unwrap();
    match schema.validate(&doc) {
        Err(Error::Validation(e)) => {
            assert!(e.path.as_deref() == Some("/n"), "path was {:?}", e.path);
        }
        other => panic!("expected a validation error, got {:?}", other),
    }
    assert!(schema
        .validate(&xsdkit::documents::Document::from_str("<n>7</n>").unwrap())
        .is_ok());
}

#[test]
fn iterfind_selects_declarations() {
    let schema = Schema::from_text(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:element name="library">
                <xs:complexType>
                    <xs:sequence>
                        <xs:element name="book" maxOccurs="unbounded">
                            <xs:complexType>
                                <xs:sequence>
                                    <xs:element name="title" type="xs:string"/>
                                    <xs:element name="author" type="xs:string"
                                                maxOccurs="unbounded"/>
                                </xs:sequence>
                            </xs:complexType>
                        </xs:element>
                    </xs:sequence>
                </xs:complexType>
            </xs:element>
        </xs:schema>"#,
    )
    .unwrap();

    let title = schema.find("/library/book/title", None).unwrap().unwrap();
    assert_eq!(title.name.local_name, "title");

    let descendants = schema.findall("//author", None).unwrap();
    assert_eq!(descendants.len(), 1);

    let all_under_book = schema.findall("/library/book/*", None).unwrap();
    assert_eq!(all_under_book.len(), 2);
}
