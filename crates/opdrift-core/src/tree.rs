//! Opaque configuration trees
//!
//! Every intent, state and artifact handled by the engine is an untyped tree
//! of JSON values. The value type is `serde_json::Value`, whose variants
//! (`Null | Bool | Number | String | Array | Object`) are matched explicitly
//! wherever the engine needs to dispatch on kind. A [`Tree`] is an object
//! node and is the root of every document.

use serde_json::{Map, Number, Value};

/// An object node: the root of every configuration document
pub type Tree = Map<String, Value>;

/// Human-readable name of a value's kind, as used in diff entries
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}

/// Exact integer value of a number, if it has one
///
/// Floats qualify only when finite, integral and inside the `i64`/`u64`
/// range, so the conversion never rounds.
fn exact_integer(n: &Number) -> Option<i128> {
    if let Some(i) = n.as_i64() {
        return Some(i128::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(i128::from(u));
    }
    let f = n.as_f64()?;
    // 2^64, the first float above u64::MAX
    const U64_END: f64 = 18_446_744_073_709_551_616.0;
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < U64_END {
        Some(f as i128)
    } else {
        None
    }
}

/// Compare two numbers by value rather than by representation
///
/// A number decoded from TOML as an integer and the same number decoded from
/// JSON as a float compare equal. Integers are compared exactly, so values
/// beyond 2^53 that a float cannot tell apart are still unequal.
pub fn numbers_equal(a: &Number, b: &Number) -> bool {
    match (exact_integer(a), exact_integer(b)) {
        (Some(x), Some(y)) => x == y,
        (None, None) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
        _ => false,
    }
}

/// Deep equality with numeric-kind tolerance
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => trees_equal(xs, ys),
        _ => false,
    }
}

/// Deep equality of two trees with numeric-kind tolerance
pub fn trees_equal(a: &Tree, b: &Tree) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .all(|(key, x)| b.get(key).is_some_and(|y| values_equal(x, y)))
}

/// Render a value for a diff entry: strings bare, everything else as compact JSON
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse a JSON document whose root must be an object
pub fn tree_from_json(input: &str) -> Result<Tree, serde_json::Error> {
    serde_json::from_str(input)
}

/// Parse a TOML document into a tree
///
/// TOML integers become JSON integers and TOML floats JSON floats; no
/// conversion between the two takes place.
pub fn tree_from_toml(input: &str) -> Result<Tree, toml::de::Error> {
    toml::from_str(input)
}

/// Serialize a tree as TOML
///
/// TOML has no null, so trees containing null values cannot be serialized.
pub fn tree_to_toml(tree: &Tree) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(tree)
}

/// Serialize a tree as pretty-printed JSON
pub fn tree_to_json(tree: &Tree) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(tree)
}
