//! JSON adapter: `serde_json::Value` → [`Loose`].
//!
//! Object keys spelled as canonical decimal integers are treated as integer
//! keys, so `{"0": .., "1": ..}` and `[.., ..]` classify the same way.
use once_cell::sync::Lazy;
use ordered_float::OrderedFloat;
use regex::Regex;
use serde_json::Value;

use crate::loose::{Key, Leaf, Loose};

static CANONICAL_INT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(0|-?[1-9][0-9]*)$").expect("static pattern")
});

/// Integer key for `s` if it is written exactly as an `i64` would print.
pub fn int_key(s: &str) -> Option<i64> {
    if !CANONICAL_INT.is_match(s) {
        return None;
    }
    s.parse::<i64>().ok()
}

pub fn key_from_str(s: String) -> Key {
    match int_key(&s) {
        Some(i) => Key::Int(i),
        None => Key::Str(s),
    }
}

impl From<Value> for Loose {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Loose::Leaf(Leaf::Null),
            Value::Bool(b) => Loose::Leaf(Leaf::Bool(b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Loose::Leaf(Leaf::Int(i)),
                None => Loose::Leaf(Leaf::Float(OrderedFloat(n.as_f64().unwrap_or(f64::NAN)))),
            },
            Value::String(s) => Loose::Leaf(Leaf::Str(s)),
            Value::Array(xs) => Loose::List(xs.into_iter().map(Loose::from).collect()),
            Value::Object(map) => Loose::Assoc(
                map.into_iter().map(|(k, v)| (key_from_str(k), Loose::from(v))).collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_integer_keys() {
        assert_eq!(int_key("0"), Some(0));
        assert_eq!(int_key("42"), Some(42));
        assert_eq!(int_key("-7"), Some(-7));
        assert_eq!(int_key(&i64::MIN.to_string()), Some(i64::MIN));
    }

    #[test]
    fn non_canonical_integer_keys_stay_strings() {
        for s in ["01", "+1", "-0", "1.0", " 1", "", "1e3", "99999999999999999999"] {
            assert_eq!(int_key(s), None, "{s:?}");
        }
    }

    #[test]
    fn object_keys_are_classified_in_order() {
        let v = Loose::from(json!({"b": 1, "3": 2, "007": 3}));
        let Loose::Assoc(map) = &v else { panic!("object must map to assoc") };
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec![Key::from("b"), Key::Int(3), Key::from("007")]);
    }

    #[test]
    fn numbers_map_to_int_or_float() {
        assert!(matches!(Loose::from(json!(5)), Loose::Leaf(Leaf::Int(5))));
        assert!(matches!(Loose::from(json!(2.5)), Loose::Leaf(Leaf::Float(x)) if x.0 == 2.5));
        assert!(matches!(Loose::from(json!(u64::MAX)), Loose::Leaf(Leaf::Float(_))));
    }
}
