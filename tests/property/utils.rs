use proptest::prelude::*;
use static_double::Value;

/// Values with a canonical encoding: finite floats, no opaque handles
pub fn keyable_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        // quarters print and parse back exactly
        (-1_000_000i32..1_000_000).prop_map(|q| Value::Float(q as f64 / 4.0)),
        any::<String>().prop_map(Value::Str),
    ];

    leaf.prop_recursive(
        3,  // levels deep
        32, // max size
        4,  // items per collection
        |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::list),
                prop::collection::vec(("[a-z]{1,6}", inner), 0..4).prop_map(Value::assoc),
            ]
        },
    )
}

pub fn argument_list() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(keyable_value(), 0..4)
}
