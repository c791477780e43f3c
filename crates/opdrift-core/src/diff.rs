//! Structural diffing of opaque trees
//!
//! The differ walks two trees side by side and reports every divergence as a
//! single `<path>: <description>` string. An empty result means the trees
//! are structurally equal. Numbers are compared by value, so an integer and
//! the equivalent float never produce an entry.

use serde_json::Value;

use crate::tree::{kind_name, render_value, values_equal, Tree};

fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

/// Diff two trees, qualifying every entry with `prefix`
///
/// Entries are returned in traversal order, which is not guaranteed to be
/// stable across inputs; use [`sorted_diff`] when the order matters.
///
/// # Examples
///
/// ```rust
/// use opdrift_core::diff_trees;
/// use serde_json::json;
///
/// let a = json!({"k": {"a": 1, "b": 2}}).as_object().cloned().unwrap();
/// let b = json!({"k": {"a": 9, "b": 2}}).as_object().cloned().unwrap();
/// assert_eq!(diff_trees("root", &a, &b), vec!["root.k.a: value mismatch (1 vs 9)"]);
/// ```
pub fn diff_trees(prefix: &str, a: &Tree, b: &Tree) -> Vec<String> {
    let mut out = Vec::new();
    diff_maps(prefix, a, b, &mut out);
    out
}

/// Diff two values found at `path`
pub fn diff_value(path: &str, a: &Value, b: &Value) -> Vec<String> {
    let mut out = Vec::new();
    diff_into(path, a, b, &mut out);
    out
}

/// [`diff_trees`] with entries in lexicographic order
pub fn sorted_diff(prefix: &str, a: &Tree, b: &Tree) -> Vec<String> {
    let mut entries = diff_trees(prefix, a, b);
    entries.sort();
    entries
}

fn diff_maps(path: &str, a: &Tree, b: &Tree, out: &mut Vec<String>) {
    for (key, left) in a {
        let child = join_key(path, key);
        match b.get(key) {
            Some(right) => diff_into(&child, left, right, out),
            None => out.push(format!(
                "{}: exists in first map but not in second (value: {})",
                child,
                render_value(left)
            )),
        }
    }

    for (key, right) in b {
        if !a.contains_key(key) {
            out.push(format!(
                "{}: exists in second map but not in first (value: {})",
                join_key(path, key),
                render_value(right)
            ));
        }
    }
}

fn diff_into(path: &str, a: &Value, b: &Value, out: &mut Vec<String>) {
    match (a, b) {
        (Value::Object(left), Value::Object(right)) => diff_maps(path, left, right, out),
        (Value::Array(left), Value::Array(right)) => {
            if left.len() != right.len() {
                out.push(format!(
                    "{}: array length mismatch ({} vs {})",
                    path,
                    left.len(),
                    right.len()
                ));
                return;
            }
            for (i, (l, r)) in left.iter().zip(right).enumerate() {
                diff_into(&format!("{}[{}]", path, i), l, r, out);
            }
        }
        (Value::Object(_) | Value::Array(_), _) | (_, Value::Object(_) | Value::Array(_)) => {
            out.push(format!(
                "{}: type mismatch ({} vs {})",
                path,
                kind_name(a),
                kind_name(b)
            ));
        }
        _ => {
            if !values_equal(a, b) {
                out.push(format!(
                    "{}: value mismatch ({} vs {})",
                    path,
                    render_value(a),
                    render_value(b)
                ));
            }
        }
    }
}
