// Field bindings: derived and hand-registered records in both directions

mod common;

use std::collections::BTreeMap;

use docwire::binding::{FieldBinding, binding_for, record_shape};
use docwire::{
    DocumentData, ErrorKind, FieldValue, Host, MapValue, PropertyBag, Sentinel, Shape, Value,
    from_map,
};

use common::*;

#[test]
fn bindings_follow_declaration_order() {
    let names: Vec<_> = Player::bindings().iter().map(|b| b.name).collect();
    assert_eq!(names, ["name", "tags", "stats", "joined", "rank"]);

    let rank = binding_for::<Player>("rank").unwrap();
    assert!(rank.set.is_none());
    assert!(binding_for::<Player>("session_token").is_none());
    assert!(binding_for::<Player>("joined_at").is_none());
}

#[test]
fn every_binding_appears_once_in_the_document() {
    let player = Player {
        name: "Ann".into(),
        tags: vec!["pro".into()],
        rank: 3,
        session_token: "secret".into(),
        ..Player::default()
    };
    let document = docwire::serialize_map(&player).unwrap();
    assert_eq!(
        document.keys().map(String::as_str).collect::<Vec<_>>(),
        ["joined", "name", "rank", "stats", "tags"]
    );
    assert_eq!(document["joined"], Value::Null);
    assert_eq!(document["rank"], Value::Integer(3));
    assert_eq!(
        document["stats"],
        map([
            ("losses", Value::Integer(0)),
            ("ratio", Value::Null),
            ("wins", Value::Integer(0)),
        ])
    );
}

#[test]
fn server_timestamp_binding_overrides_the_field_value() {
    let model = SentinelModel {
        name: "Jon".into(),
        last_update: timestamp(1_507_251_723, 0),
        score: 7,
    };
    let document = docwire::serialize_map(&model).unwrap();
    assert_eq!(
        document,
        fields([
            ("lastUpdate", Sentinel::ServerTimestamp.to_wire()),
            ("name", Value::String("Jon".into())),
            ("score", Value::Integer(7)),
        ])
    );
}

#[test]
fn server_timestamp_binding_applies_to_nested_records() {
    let mut outer = BTreeMap::new();
    outer.insert("model", SentinelModel::default());
    let document = docwire::serialize_map(&outer).unwrap();
    let Value::Map(model) = &document["model"] else {
        panic!("expected a map");
    };
    assert_eq!(model.fields["lastUpdate"], Value::Sentinel(Sentinel::ServerTimestamp));
}

#[test]
fn sentinels_as_field_values() {
    let bag = PropertyBag::new()
        .with("name", "Jon")
        .with("lastUpdate", FieldValue::SERVER_TIMESTAMP)
        .with("score", FieldValue::DELETE)
        .with("audit", PropertyBag::new().with("at", FieldValue::SERVER_TIMESTAMP));
    let document = docwire::serialize_map(&bag).unwrap();
    assert_eq!(
        document,
        fields([
            ("audit", map([("at", Value::Sentinel(Sentinel::ServerTimestamp))])),
            ("lastUpdate", Value::Sentinel(Sentinel::ServerTimestamp)),
            ("name", Value::String("Jon".into())),
            ("score", Value::Sentinel(Sentinel::Delete)),
        ])
    );

    let split = docwire::extract_sentinels(&document);
    assert_eq!(split.data, fields([("name", Value::String("Jon".into()))]));
    assert_eq!(split.server_timestamps.len(), 2);
    assert_eq!(split.deletes.len(), 1);
}

#[test]
fn sentinels_outside_fields_are_rejected() {
    let err = docwire::serialize(&FieldValue::DELETE).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(err.message().contains("only valid as a field value"), "{err}");

    let err = docwire::serialize(&vec![FieldValue::SERVER_TIMESTAMP]).unwrap_err();
    assert!(err.message().contains("inside an array"), "{err}");

    let err = docwire::serialize(&Value::Sentinel(Sentinel::Delete)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn sentinel_fields_under_an_array_are_rejected() {
    let entry = PropertyBag::new().with("at", FieldValue::SERVER_TIMESTAMP);
    let bag = PropertyBag::new()
        .with("name", "Jon")
        .with("history", vec![entry]);
    let err = docwire::serialize_map(&bag).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(err.message().starts_with("history[0].at: "), "{err}");
    assert!(err.message().contains("inside an array"), "{err}");

    let audit = PropertyBag::new().with("gone", FieldValue::DELETE);
    let deep = PropertyBag::new().with("audit", audit);
    let err = docwire::serialize(&vec![deep]).unwrap_err();
    assert_eq!(
        err.message(),
        "[0].audit.gone: sentinel DELETE cannot be used inside an array"
    );
}

#[test]
fn server_timestamp_records_under_an_array_are_rejected() {
    let err = docwire::serialize(&vec![SentinelModel::default()]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(
        err.message(),
        "[0].lastUpdate: sentinel SERVER_TIMESTAMP cannot be used inside an array"
    );

    let mut outer = BTreeMap::new();
    outer.insert("models", vec![SentinelModel::default()]);
    let err = docwire::serialize_map(&outer).unwrap_err();
    assert!(err.message().starts_with("models[0].lastUpdate: "), "{err}");
}

#[test]
fn wire_sentinels_under_an_array_are_rejected() {
    let element = map([("at", Value::Sentinel(Sentinel::Delete))]);
    let wire: MapValue = [("entries", array([element]))].into_iter().collect();
    let err = docwire::serialize_map(&wire).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(err.message().starts_with("entries[0].at: "), "{err}");

    let err = docwire::serialize_map(&Value::Map(wire)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn wire_maps_serialize_as_document_fields() {
    let document = fields([
        ("name", Value::String("Jon".into())),
        ("lastUpdate", Value::Sentinel(Sentinel::ServerTimestamp)),
        ("audit", map([("gone", Value::Sentinel(Sentinel::Delete))])),
    ]);
    let wire = Value::Map(MapValue::new(document.clone()));
    assert_eq!(docwire::serialize_map(&wire).unwrap(), document);

    let split = docwire::extract_sentinels(&document);
    assert_eq!(split.data, fields([("name", Value::String("Jon".into()))]));
    assert_eq!(split.server_timestamps.len(), 1);
    assert_eq!(split.deletes.len(), 1);
}

#[test]
fn sentinel_lookalike_strings_stay_strings() {
    let bag = PropertyBag::new()
        .with("a", "SERVER_TIMESTAMP")
        .with("b", Sentinel::Delete.name());
    let document = docwire::serialize_map(&bag).unwrap();
    assert_eq!(document["a"], Value::String("SERVER_TIMESTAMP".into()));
    assert!(!document.values().any(Value::is_sentinel));
}

#[test]
fn documents_read_back_into_records() {
    let document = fields([
        ("name", Value::String("Ann".into())),
        ("tags", array([Value::String("pro".into())])),
        (
            "stats",
            map([("wins", Value::Integer(4)), ("ratio", Value::Double(0.8))]),
        ),
        ("joined", Value::Timestamp(timestamp(1_600_000_000, 0))),
        ("rank", Value::Integer(99)),
        ("session_token", Value::String("leaked".into())),
        ("unknown", Value::Boolean(true)),
    ]);
    let player: Player = from_map(&document).unwrap();
    assert_eq!(
        player,
        Player {
            name: "Ann".into(),
            tags: vec!["pro".into()],
            stats: Stats {
                wins: 4,
                losses: 0,
                ratio: Some(0.8),
            },
            joined_at: Some(timestamp(1_600_000_000, 0)),
            rank: 0,
            session_token: String::new(),
        }
    );
}

#[test]
fn serialized_records_read_back_unchanged() {
    let result = GameResult {
        name: "Jon".into(),
        score: -3,
    };
    let value = docwire::serialize(&result).unwrap();
    assert_eq!(docwire::deserialize::<GameResult>(&value).unwrap(), result);
}

#[test]
fn read_errors_name_the_field() {
    let document = fields([("Score", Value::String("ten".into()))]);
    let err = from_map::<GameResult>(&document).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(err.message(), "Score: expected integer, found string");

    let err = from_map::<GameResult>(&fields([("Score", Value::Integer(i64::MAX))])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Overflow);
    assert!(err.message().starts_with("Score: "), "{err}");

    let err = from_map::<Player>(&fields([(
        "stats",
        map([("wins", Value::Integer(-1))]),
    )]))
    .unwrap_err();
    assert!(err.message().starts_with("stats: wins: "), "{err}");
}

/// Registered by hand, with a name collision the derive would refuse.
#[derive(Default)]
struct Colliding {
    first: i32,
    second: i32,
}

fn first(c: &Colliding) -> &dyn Host {
    &c.first
}

fn second(c: &Colliding) -> &dyn Host {
    &c.second
}

impl DocumentData for Colliding {
    fn bindings() -> &'static [FieldBinding<Self>] {
        const BINDINGS: &[FieldBinding<Colliding>] = &[
            FieldBinding {
                name: "value",
                get: first,
                set: None,
                server_timestamp: false,
            },
            FieldBinding {
                name: "value",
                get: second,
                set: None,
                server_timestamp: false,
            },
        ];
        BINDINGS
    }
}

impl Host for Colliding {
    fn shape(&self) -> Shape<'_> {
        record_shape(self)
    }
}

#[test]
fn duplicate_document_names_are_rejected() {
    let err = docwire::serialize_map(&Colliding::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(err.message().contains("duplicate field name 'value'"), "{err}");
}
