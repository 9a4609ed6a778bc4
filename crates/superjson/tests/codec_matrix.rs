use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use serde_json::{json, Value as Json};
use superjson::{
    BigInt, DecodeError, Document, EncodeError, ErrorObject, Kind, Node, RegExp, SuperJson, SuperJsonOptions,
    Value,
};

fn envelope(doc: &Document) -> Json {
    superjson::serialize(doc).expect("encode").to_json()
}

fn dedupe() -> SuperJson {
    SuperJson::with_options(SuperJsonOptions { dedupe: true, ..Default::default() })
}

fn rooted(build: impl FnOnce(&mut Document) -> Value) -> Document {
    let mut doc = Document::new();
    let root = build(&mut doc);
    doc.set_root(root);
    doc
}

#[test]
fn golden_envelope_matrix() {
    let cases: Vec<(Document, Json)> = vec![
        (
            rooted(|d| {
                let date = d.new_date(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
                d.new_object([("createdAt", date)])
            }),
            json!({"json": {"createdAt": "2023-01-01T00:00:00.000Z"}, "meta": {"values": {"createdAt": ["Date"]}, "v": 1}}),
        ),
        (
            rooted(|d| {
                let map = d.new_map([("key1", "value1"), ("key2", "value2")]);
                d.new_object([("map", map)])
            }),
            json!({"json": {"map": [["key1", "value1"], ["key2", "value2"]]}, "meta": {"values": {"map": ["map"]}, "v": 1}}),
        ),
        (
            rooted(|d| {
                let set = d.new_set([1, 2, 3]);
                d.new_object([("set", set)])
            }),
            json!({"json": {"set": [1, 2, 3]}, "meta": {"values": {"set": ["set"]}, "v": 1}}),
        ),
        (
            rooted(|d| d.new_object([("a", Value::Undefined), ("b", Value::Null)])),
            json!({"json": {"b": null}, "meta": {"values": {"a": ["undefined"]}, "v": 1}}),
        ),
        (
            rooted(|d| d.new_array([Value::Undefined, Value::from(1)])),
            json!({"json": [null, 1], "meta": {"values": {"0": ["undefined"]}, "v": 1}}),
        ),
        (Document::new(), json!({"meta": {"values": ["undefined"], "v": 1}})),
        (rooted(|_| Value::Null), json!({"json": null})),
        (
            rooted(|_| BigInt::from(10).into()),
            json!({"json": "10", "meta": {"values": ["bigint"], "v": 1}}),
        ),
        (
            rooted(|d| d.new_error(ErrorObject::with_name("TypeError", "bad").with_prop("code", json!(7)))),
            json!({"json": {"name": "TypeError", "message": "bad"}, "meta": {"values": ["Error"], "v": 1}}),
        ),
        (
            rooted(|d| d.new_regexp(RegExp::new("ab+c", "gi").unwrap())),
            json!({"json": "/ab+c/gi", "meta": {"values": ["regexp"], "v": 1}}),
        ),
        (
            rooted(|d| d.new_url("https://example.com/a?b=1".parse().unwrap())),
            json!({"json": "https://example.com/a?b=1", "meta": {"values": ["URL"], "v": 1}}),
        ),
        (
            rooted(|d| {
                let date = d.new_date(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
                let map = d.new_map([(Value::from(1), date)]);
                let item = d.new_object([("m", map)]);
                d.new_array([item])
            }),
            json!({
                "json": [{"m": [[1, "2023-01-01T00:00:00.000Z"]]}],
                "meta": {"values": {"0.m": ["map", {"0.1": ["Date"]}]}, "v": 1}
            }),
        ),
    ];

    for (doc, expected) in cases {
        assert_eq!(envelope(&doc), expected, "envelope of {}", doc.inspect());
        let back = superjson::deserialize(&superjson::Envelope::from_json(&expected).unwrap()).unwrap();
        if doc.kind(doc.root()) != Kind::Error {
            assert_eq!(back, doc, "round trip of {}", doc.inspect());
        }
    }
}

#[test]
fn allowed_error_props_are_kept() {
    let doc = rooted(|d| d.new_error(ErrorObject::new("boom").with_prop("code", json!("E_BOOM"))));
    let mut codec = SuperJson::new();
    codec.allow_error_prop("code");
    let env = codec.serialize(&doc).unwrap();
    assert_eq!(env.json, Some(json!({"name": "Error", "message": "boom", "code": "E_BOOM"})));
    assert_eq!(codec.deserialize(&env).unwrap(), doc);
}

#[test]
fn shared_reference_with_and_without_dedupe() {
    let doc = rooted(|d| {
        let shared = d.new_object([("x", 1)]);
        let deep = d.new_object([("inner", shared.clone())]);
        d.new_object([("deep", deep), ("s", shared)])
    });

    assert_eq!(
        envelope(&doc),
        json!({
            "json": {"deep": {"inner": {"x": 1}}, "s": {"x": 1}},
            "meta": {"referentialEqualities": {"s": ["deep.inner"]}, "v": 1}
        })
    );
    assert_eq!(
        dedupe().serialize(&doc).unwrap().to_json(),
        json!({
            "json": {"deep": {"inner": {"x": 1}}, "s": null},
            "meta": {"referentialEqualities": {"deep.inner": ["s"]}, "v": 1}
        })
    );

    for text in [superjson::stringify(&doc).unwrap(), dedupe().stringify(&doc).unwrap()] {
        let back = superjson::parse(&text).unwrap();
        assert_eq!(back, doc);
        assert_eq!(back.get_path(&["deep", "inner"]), back.get_path(&["s"]));
    }
}

#[test]
fn circular_reference_keeps_identity() {
    let doc = rooted(|d| {
        let root = d.new_object([("name", "circular")]);
        d.set_field(&root, "self", root.clone());
        root
    });

    let text = superjson::stringify(&doc).unwrap();
    assert_eq!(
        text,
        r#"{"json":{"name":"circular","self":null},"meta":{"referentialEqualities":[["self"]],"v":1}}"#
    );

    let back = superjson::parse(&text).unwrap();
    assert_eq!(back.get(back.root(), "self"), Some(back.root()));
    assert_eq!(back.get_path(&["self", "self", "name"]), Some(&Value::from("circular")));
}

#[test]
fn nested_cycle_below_root() {
    let doc = rooted(|d| {
        let child = d.new_object([("id", 1)]);
        let parent = d.new_object([("child", child.clone())]);
        d.set_field(&child, "parent", parent.clone());
        d.new_array([parent])
    });
    let env = envelope(&doc);
    assert_eq!(env["json"], json!([{"child": {"id": 1, "parent": null}}]));
    assert_eq!(env["meta"]["referentialEqualities"], json!({"0": ["0.child.parent"]}));

    let back = superjson::parse(&env.to_string()).unwrap();
    assert_eq!(back.get_path(&["0", "child", "parent"]), back.get_path(&["0"]));
}

#[test]
fn deeply_nested_fifty_levels() {
    let doc = rooted(|d| {
        let date = d.new_date(Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap());
        let mut current = d.new_object([("value", date)]);
        for level in (0..50).rev() {
            current = d.new_object([("level", Value::from(level)), ("next", current)]);
        }
        current
    });
    let back = superjson::parse(&superjson::stringify(&doc).unwrap()).unwrap();
    assert_eq!(back, doc);

    let mut path = vec!["next"; 50];
    path.push("value");
    assert_eq!(back.kind(back.get_path(&path).unwrap()), Kind::Date);
}

#[test]
fn nesting_past_two_hundred_levels() {
    let doc = rooted(|d| {
        let mut current = d.new_object([("leaf", true)]);
        for _ in 0..200 {
            current = d.new_object([("next", current)]);
        }
        current
    });
    let text = superjson::stringify(&doc).unwrap();
    assert_eq!(superjson::parse(&text).unwrap(), doc);

    // Typed containers nest in `meta.values` as well as in `json`.
    let sets = rooted(|d| {
        let mut current = d.new_set([BigInt::from(1)]);
        for _ in 0..150 {
            current = d.new_set([current]);
        }
        current
    });
    let text = superjson::stringify(&sets).unwrap();
    assert_eq!(superjson::parse(&text).unwrap(), sets);
}

#[test]
fn repeated_bigints_and_nans_round_trip() {
    let doc = rooted(|d| {
        let nans = d.new_array([f64::NAN, f64::NAN]);
        d.new_object([("a", BigInt::from(1).into()), ("b", BigInt::from(1).into()), ("n", nans)])
    });
    for codec in [SuperJson::new(), dedupe()] {
        let back = codec.parse(&codec.stringify(&doc).unwrap()).unwrap();
        assert_eq!(back, doc);
        assert_eq!(back.get_path(&["b"]), Some(&Value::BigInt(BigInt::from(1))));
        assert!(back.get_path(&["n", "1"]).unwrap().as_f64().unwrap().is_nan());
    }
}

#[test]
fn map_lookup_after_round_trip() {
    let doc = rooted(|d| {
        let key = d.new_object([("id", 7)]);
        let map = d.new_map([(Value::from("key1"), Value::from("value1")), (key.clone(), Value::from("object"))]);
        d.new_object([("map", map), ("key", key)])
    });
    let back = superjson::parse(&superjson::stringify(&doc).unwrap()).unwrap();
    let map = back.get_path(&["map"]).unwrap();
    assert_eq!(back.map_get(map, &Value::from("key1")), Some(&Value::from("value1")));
    let key = back.get_path(&["key"]).unwrap();
    assert_eq!(back.map_get(map, key), Some(&Value::from("object")));
}

#[test]
fn special_numbers_survive() {
    let doc = rooted(|d| d.new_array([f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -0.0, 0.5]));
    let back = superjson::parse(&superjson::stringify(&doc).unwrap()).unwrap();
    assert_eq!(back, doc);
    let Some(Node::Array(items)) = back.node(back.root()) else {
        panic!("expected array");
    };
    assert!(items[3].as_f64().unwrap().is_sign_negative());
}

#[test]
fn error_matrix() {
    let forbidden = rooted(|d| d.new_object([("constructor", 1)]));
    assert!(matches!(superjson::serialize(&forbidden), Err(EncodeError::ForbiddenKey(_))));

    assert!(matches!(superjson::parse("{"), Err(DecodeError::Json(_))));
    assert!(matches!(
        superjson::parse(r#"{"json":"x","meta":{"values":["bigint"],"v":1}}"#),
        Err(DecodeError::InvalidBigInt(_))
    ));
    assert!(matches!(
        superjson::parse(r#"{"json":"not a date","meta":{"values":["Date"],"v":1}}"#),
        Err(DecodeError::InvalidDate(_))
    ));
    assert!(matches!(
        superjson::parse(r#"{"json":"/x/q","meta":{"values":["regexp"],"v":1}}"#),
        Err(DecodeError::InvalidRegExp(_))
    ));
    assert!(matches!(
        superjson::parse(r#"{"json":"relative/path","meta":{"values":["URL"],"v":1}}"#),
        Err(DecodeError::InvalidUrl { .. })
    ));
    assert!(matches!(
        superjson::parse(r#"{"json":{},"meta":{"values":{"a\\q":["undefined"]},"v":1}}"#),
        Err(DecodeError::InvalidPath(_))
    ));
    assert!(matches!(
        superjson::parse(r#"{"json":{},"meta":{"values":[["custom","Decimal"]],"v":1}}"#),
        Err(DecodeError::UnsupportedType(_))
    ));
}

fn arb_json() -> impl Strategy<Value = Json> {
    let leaf = prop_oneof![
        Just(Json::Null),
        any::<bool>().prop_map(Json::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        prop::num::f64::NORMAL.prop_map(|n| json!(n)),
        "[a-z.\\\\]{0,8}".prop_map(Json::String),
    ];
    leaf.prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Json::Array),
            prop::collection::vec(("[a-z.]{1,6}", inner), 0..6)
                .prop_map(|fields| Json::Object(fields.into_iter().collect())),
        ]
    })
}

#[test]
fn floats_survive_text_round_trip() {
    for n in [1.2761204204598835e-188, 0.1 + 0.2, 5e-324, 1.7976931348623157e308, 1e21, 2f64.powi(70)] {
        let doc = Document::from_json(&json!([n]));
        let text = superjson::stringify(&doc).unwrap();
        assert_eq!(superjson::parse(&text).unwrap(), doc, "{text}");
    }
    let doc = Document::from_json(&json!([1e21, 1.5e300]));
    assert_eq!(superjson::stringify(&doc).unwrap(), r#"{"json":[1e+21,1.5e+300]}"#);
}

proptest! {
    #[test]
    fn plain_json_passes_through(json in arb_json()) {
        let doc = Document::from_json(&json);
        let env = superjson::serialize(&doc).unwrap();
        prop_assert!(env.meta.is_none());

        let text = superjson::stringify(&doc).unwrap();
        let back = superjson::parse(&text).unwrap();
        prop_assert_eq!(back, doc);
    }
}
