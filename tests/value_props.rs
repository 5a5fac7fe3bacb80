//! Property tests for the value-model laws.

use proptest::prelude::*;

use sass_eval::value::{SassMap, SassNumber, Value};

fn unit_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("px".to_owned())),
        Just(Some("in".to_owned())),
        Just(Some("cm".to_owned())),
        Just(Some("deg".to_owned())),
        Just(Some("fib".to_owned())),
    ]
}

fn number_strategy() -> impl Strategy<Value = SassNumber> {
    (-1.0e6..1.0e6f64, unit_strategy()).prop_map(|(value, unit)| match unit {
        Some(unit) => SassNumber::with_unit(value, unit),
        None => SassNumber::unitless(value),
    })
}

fn value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        number_strategy().prop_map(Value::Number),
        "[a-z]{0,8}".prop_map(Value::unquoted_string),
        "[a-z]{0,8}".prop_map(Value::quoted_string),
    ];
    leaf.prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::space_list),
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::comma_list),
            prop::collection::vec((inner.clone(), inner), 0..4)
                .prop_map(|pairs| Value::Map(pairs.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn without_slash_is_idempotent(value in value_strategy(), divisor in number_strategy()) {
        // attach a slash form where the value is a number
        let slashed = match value {
            Value::Number(n) => {
                Value::Number(n.clone().with_slash(n, divisor))
            }
            other => other,
        };

        let once = slashed.clone().without_slash();
        let twice = once.clone().without_slash();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn as_list_is_idempotent(value in value_strategy()) {
        let list = value.as_list();
        let relisted = Value::List {
            elements: list.clone(),
            separator: value.separator(),
            bracketed: false,
        }
        .as_list();
        prop_assert_eq!(list, relisted);
    }

    #[test]
    fn number_equality_is_symmetric(a in number_strategy(), b in number_strategy()) {
        prop_assert_eq!(a == b, b == a);
    }

    #[test]
    fn unit_conversion_round_trips(value in -1.0e6..1.0e6f64) {
        let px = SassNumber::with_unit(value, "px");
        let inches = px
            .coerce(&["in".to_owned()], &[])
            .expect("px and in are compatible");
        let back = inches
            .coerce(&["px".to_owned()], &[])
            .expect("in and px are compatible");
        prop_assert_eq!(&px, &back);
    }

    #[test]
    fn truthiness_partition(value in value_strategy()) {
        let falsey = matches!(value, Value::Null | Value::Bool(false));
        prop_assert_eq!(value.is_truthy(), !falsey);
    }
}

#[test]
fn map_round_trips_through_pairs() {
    let map: SassMap = vec![
        (
            Value::unquoted_string("a"),
            Value::Number(SassNumber::unitless(1.0)),
        ),
        (
            Value::unquoted_string("b"),
            Value::Number(SassNumber::with_unit(2.0, "px")),
        ),
    ]
    .into_iter()
    .collect();

    // view as (key value) pairs, then rebuild
    let rebuilt: SassMap = Value::Map(map.clone())
        .as_list()
        .into_iter()
        .map(|pair| {
            let mut items = pair.as_list().into_iter();
            (items.next().unwrap(), items.next().unwrap())
        })
        .collect();

    assert_eq!(map, rebuilt);
}
