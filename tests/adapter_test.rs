use trellis::adapter::{InputAdapter, InputFormat, JsonAdapter, XmlAdapter};
use trellis::error::Error;
use serde_json::json;

const XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- site description -->
<project name="demo" lang="en">
    <title>  Hello &amp; welcome  </title>
    <page id="1" path="index.html">
        <section/>
        <section kind="footer"><![CDATA[<b>raw</b>]]></section>
    </page>
    <empty>

    </empty>
</project>
"#;

#[test]
fn test_xml_preserves_structure() {
    let root = XmlAdapter::new().build(XML).unwrap();

    assert_eq!(root.tag(), "project");
    assert_eq!(root.attribute("name"), Some(&json!("demo")));
    assert_eq!(root.attribute("lang"), Some(&json!("en")));
    assert_eq!(root.value(), None);

    let tags: Vec<&str> = root.children().map(|child| child.tag()).collect();
    assert_eq!(tags, ["title", "page", "empty"]);

    let children: Vec<_> = root.children().collect();
    assert_eq!(children[0].value(), Some("Hello & welcome"));
    assert_eq!(children[1].children().len(), 2);
    assert_eq!(children[1].attributes().keys().collect::<Vec<_>>(), ["id", "path"]);
    assert!(children[2].attributes().is_empty());

    let footer = children[1].children().nth(1).unwrap();
    assert_eq!(footer.value(), Some("<b>raw</b>"));
    assert_eq!(footer.attribute("kind"), Some(&json!("footer")));
}

#[test]
fn test_xml_value_is_text_before_first_child() {
    let root = XmlAdapter::new().build("<p>Hello <b>x</b> world</p>").unwrap();

    assert_eq!(root.value(), Some("Hello"));
    let bold = root.children().next().unwrap();
    assert_eq!(bold.value(), Some("x"));
}

#[test]
fn test_raw_xml_keeps_text_verbatim() {
    let root = XmlAdapter::raw()
        .build("<file>\n  <content>  two spaces\n</content>\n</file>")
        .unwrap();

    assert_eq!(root.value(), None);
    let content = root.children().next().unwrap();
    assert_eq!(content.value(), Some("  two spaces\n"));
}

#[test]
fn test_xml_serializes_to_json_tree() {
    let root = XmlAdapter::new().build(XML).unwrap();
    let tree = serde_json::to_value(&root).unwrap();

    assert_eq!(
        tree,
        json!({
            "tag": "project",
            "attributes": {"name": "demo", "lang": "en"},
            "children": [
                {"tag": "title", "value": "Hello & welcome"},
                {
                    "tag": "page",
                    "attributes": {"id": "1", "path": "index.html"},
                    "children": [
                        {"tag": "section"},
                        {"tag": "section", "value": "<b>raw</b>", "attributes": {"kind": "footer"}}
                    ]
                },
                {"tag": "empty"}
            ]
        })
    );
}

#[test]
fn test_json_round_trip_matches_xml() {
    let from_xml = XmlAdapter::new().build(XML).unwrap();
    let json_text = serde_json::to_string(&from_xml).unwrap();
    let from_json = JsonAdapter::new().build(&json_text).unwrap();

    assert_eq!(from_xml, from_json);
}

#[test]
fn test_json_flattens_attributes() {
    let source = r#"{
        "tag": "page",
        "value": "  body text ",
        "attributes": {"title": "Home", "order": 2},
        "children": [{"tag": "p", "value": "   "}, {"tag": "p"}]
    }"#;
    let root = JsonAdapter::new().build(source).unwrap();

    assert_eq!(root.value(), Some("body text"));
    assert_eq!(root.attribute("title"), Some(&json!("Home")));
    assert_eq!(root.attribute("order"), Some(&json!(2)));
    assert_eq!(root.children().len(), 2);
    assert!(root.children().all(|child| child.value().is_none()));
}

#[test]
fn test_malformed_xml_is_parse_error() {
    for source in ["", "<a><b></a>", "<a>", "<a/><b/>", "text<a/>", "<a x=\"1\" x=\"2\"/>"] {
        let result = XmlAdapter::new().build(source);
        assert!(matches!(result, Err(Error::ParseError(_))), "{source:?} should not parse");
    }
}

#[test]
fn test_malformed_json_is_parse_error() {
    for source in ["", "{", r#"{"value": "no tag"}"#, r#"{"tag": "a", "children": {}}"#] {
        let result = JsonAdapter::new().build(source);
        assert!(matches!(result, Err(Error::ParseError(_))), "{source:?} should not parse");
    }
}

#[test]
fn test_reserved_names_are_rejected() {
    assert!(matches!(XmlAdapter::new().build(r#"<a tag="x"/>"#), Err(Error::ParseError(_))));
    assert!(matches!(XmlAdapter::new().build(r#"<a children="x"/>"#), Err(Error::ParseError(_))));
    assert!(matches!(
        JsonAdapter::new().build(r#"{"tag": "a", "attributes": {"tag": "b"}}"#),
        Err(Error::ParseError(_))
    ));
}

#[test]
fn test_value_attribute_conflicts_with_text() {
    let result = XmlAdapter::new().build(r#"<a value="x">text</a>"#);
    assert!(matches!(result, Err(Error::ParseError(_))));

    let root = XmlAdapter::new().build(r#"<a value="x"/>"#).unwrap();
    assert_eq!(root.value(), Some("x"));
}

#[test]
fn test_format_adapter_dispatch() {
    let adapter = InputFormat::from_path("tree.json").unwrap().adapter();
    let root = adapter.build(r#"{"tag": "root"}"#).unwrap();
    assert_eq!(root.tag(), "root");

    let adapter = InputFormat::from_path("main.xml").unwrap().adapter();
    assert_eq!(adapter.build("<root/>").unwrap().tag(), "root");
}
