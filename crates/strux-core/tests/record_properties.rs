//! # Record Property Tests
//!
//! Field guard closure and mapping round-trips over generated inputs.

use proptest::prelude::*;
use strux_core::{Access, StructType, Structure, UnknownKeys, Value};

strux_core::structure! {
    pub struct Coordinates {
        pub lat,
        pub lng,
    }
}

strux_core::structure! {
    pub struct Venue {
        pub name,
        pub capacity = 0,
        pub location,
        pub aliases,
    }
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        (-1.0e9f64..1.0e9).prop_map(Value::Float),
        "[a-zA-Z0-9 ']{0,12}".prop_map(Value::String),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            (inner.clone(), inner).prop_map(|(lat, lng)| Value::from(Coordinates { lat, lng })),
        ]
    })
}

proptest! {
    #[test]
    fn undeclared_names_always_rejected(name in "[a-z_]{1,10}") {
        prop_assume!(!Venue::has_field(&name));
        let mut venue = Venue::default();

        let read = venue.get(&name).unwrap_err();
        prop_assert_eq!(read.access, Access::Get);
        prop_assert_eq!(read.type_name, "Venue");

        let write = venue.set(&name, Value::from(1)).unwrap_err();
        prop_assert_eq!(write.access, Access::Set);
        prop_assert_eq!(venue, Venue::default());
    }

    #[test]
    fn declared_names_always_accepted(index in 0usize..4, v in value()) {
        let name = Venue::FIELDS[index];
        let mut venue = Venue::default();
        venue.set(name, v.clone()).unwrap();
        prop_assert_eq!(venue.get(name).unwrap(), &v);
    }

    #[test]
    fn strict_round_trip_is_lossless(
        name in value(),
        capacity in value(),
        location in value(),
        aliases in value(),
    ) {
        let venue = Venue { name, capacity, location, aliases };
        let rebuilt = Venue::from_map(venue.to_map(), UnknownKeys::Reject).unwrap();
        prop_assert_eq!(rebuilt, venue);
    }
}

#[test]
fn to_map_keeps_nested_records_unexpanded() {
    let venue = Venue {
        location: Coordinates {
            lat: Value::from(59.9),
            lng: Value::from(10.7),
        }
        .into(),
        ..Venue::default()
    };
    let map = venue.to_map();
    let nested = map.get("location").unwrap();
    let coords = nested.downcast_ref::<Coordinates>().unwrap();
    assert_eq!(coords.lat, Value::from(59.9));
}

#[test]
fn unknown_key_strict_versus_discard() {
    let strict = Venue::from_map([("unknownKey", 1)], UnknownKeys::Reject);
    assert!(strict.is_err());

    let lenient = Venue::from_map([("unknownKey", 1)], UnknownKeys::Discard).unwrap();
    assert_eq!(lenient, Venue::default());
    assert!(!lenient.to_map().contains_key("unknownKey"));
}
