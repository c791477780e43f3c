//! Path selector evaluation over opaque trees
//!
//! A selector addresses one node of a [`Tree`] with dot-separated key
//! segments, `[N]` array indices and a terminal `[#]` length query:
//!
//! - `superchainRoles.guardian`
//! - `chains.[0].roles.batcher` (or equivalently `chains[0].roles.batcher`)
//! - `opChainDeployments.[#]`
//!
//! Selectors are parsed once and can be evaluated against any number of
//! trees. [`read`] never mutates, [`write`] creates missing intermediate
//! nodes, and [`copy`] leaves the destination untouched if the read fails.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::{SelectorError, TreeError};
use crate::tree::{kind_name, Tree};

/// A single step of a selector
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object key lookup
    Key(String),
    /// Array element lookup
    Index(usize),
    /// Length of the array, object or string reached so far
    Length,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(key),
            Segment::Index(index) => write!(f, "[{}]", index),
            Segment::Length => f.write_str("[#]"),
        }
    }
}

/// A parsed, immutable path selector
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    segments: Vec<Segment>,
}

impl Selector {
    /// Parse a selector expression
    ///
    /// # Examples
    ///
    /// ```rust
    /// use opdrift_core::selector::{Segment, Selector};
    ///
    /// let selector = Selector::parse("chains[0].roles.batcher").unwrap();
    /// assert_eq!(selector.segments()[1], Segment::Index(0));
    /// assert_eq!(selector.to_string(), "chains.[0].roles.batcher");
    /// ```
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        if input.is_empty() {
            return Err(SelectorError::Empty);
        }

        let mut segments = Vec::new();
        for (position, part) in input.split('.').enumerate() {
            if part.is_empty() {
                return Err(SelectorError::EmptySegment {
                    selector: input.to_string(),
                    position,
                });
            }
            parse_part(input, part, &mut segments)?;
        }

        if let Some(idx) = segments.iter().position(|s| *s == Segment::Length) {
            if idx + 1 != segments.len() {
                return Err(SelectorError::LengthNotLast {
                    selector: input.to_string(),
                });
            }
        }

        Ok(Self { segments })
    }

    /// Build a selector from already-validated segments
    ///
    /// Returns `None` for an empty list or a misplaced length query.
    pub fn from_segments(segments: Vec<Segment>) -> Option<Self> {
        let length_pos = segments.iter().position(|s| *s == Segment::Length);
        match length_pos {
            _ if segments.is_empty() => None,
            Some(idx) if idx + 1 != segments.len() => None,
            _ => Some(Self { segments }),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True when the selector ends in a `[#]` length query
    pub fn is_length_query(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Length))
    }

    fn not_found(&self, segment: &Segment) -> TreeError {
        TreeError::NotFound {
            selector: self.to_string(),
            segment: segment.to_string(),
        }
    }

    fn invalid_write(&self, reason: impl Into<String>) -> TreeError {
        TreeError::InvalidWrite {
            selector: self.to_string(),
            reason: reason.into(),
        }
    }
}

/// Parse one dot-delimited part: an optional key followed by bracket groups
fn parse_part(input: &str, part: &str, segments: &mut Vec<Segment>) -> Result<(), SelectorError> {
    let malformed = || SelectorError::MalformedBracket {
        selector: input.to_string(),
    };

    let (key, mut rest) = match part.find('[') {
        Some(open) => part.split_at(open),
        None => (part, ""),
    };
    if key.contains(']') {
        return Err(malformed());
    }
    if !key.is_empty() {
        segments.push(Segment::Key(key.to_string()));
    }

    while !rest.is_empty() {
        let inner = rest.strip_prefix('[').ok_or_else(malformed)?;
        let close = inner.find(']').ok_or_else(malformed)?;
        let index = &inner[..close];
        if index.contains('[') {
            return Err(malformed());
        }

        let segment = match index {
            "#" => Segment::Length,
            digits if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                let value = digits.parse().map_err(|_| SelectorError::InvalidIndex {
                    selector: input.to_string(),
                    index: index.to_string(),
                })?;
                Segment::Index(value)
            }
            _ => {
                return Err(SelectorError::InvalidIndex {
                    selector: input.to_string(),
                    index: index.to_string(),
                })
            }
        };
        segments.push(segment);
        rest = &inner[close + 1..];
    }

    Ok(())
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// Read the node addressed by `selector`
///
/// Returns an owned copy of the node, or for a `[#]` query the length of the
/// array, object or string reached. Numbers are returned exactly as stored.
pub fn read(tree: &Tree, selector: &Selector) -> Result<Value, TreeError> {
    // `None` stands for the root map itself.
    let mut current: Option<&Value> = None;

    for segment in selector.segments() {
        match segment {
            Segment::Key(key) => {
                let map = match current {
                    None => tree,
                    Some(Value::Object(map)) => map,
                    Some(_) => return Err(selector.not_found(segment)),
                };
                current = Some(map.get(key).ok_or_else(|| selector.not_found(segment))?);
            }
            Segment::Index(index) => match current {
                Some(Value::Array(items)) => {
                    current = Some(items.get(*index).ok_or_else(|| selector.not_found(segment))?);
                }
                _ => return Err(selector.not_found(segment)),
            },
            Segment::Length => {
                let len = match current {
                    None => tree.len(),
                    Some(Value::Array(items)) => items.len(),
                    Some(Value::Object(map)) => map.len(),
                    Some(Value::String(s)) => s.chars().count(),
                    Some(_) => return Err(selector.not_found(segment)),
                };
                return Ok(Value::from(len));
            }
        }
    }

    Ok(match current {
        Some(value) => value.clone(),
        None => Value::Object(tree.clone()),
    })
}

/// Write `value` at the node addressed by `selector`
///
/// Missing intermediate keys are created as objects or arrays depending on the
/// following segment. An index may address an existing element or the
/// position one past the end, which appends. On error the tree is unchanged.
pub fn write(tree: &mut Tree, selector: &Selector, value: Value) -> Result<(), TreeError> {
    if selector.is_length_query() {
        return Err(selector.invalid_write("cannot write to a length query"));
    }

    let (head, tail) = match selector.segments().split_first() {
        Some((Segment::Key(key), tail)) => (key, tail),
        Some((segment, _)) => {
            return Err(selector.invalid_write(format!(
                "the root is a map and cannot be addressed by '{}'",
                segment
            )))
        }
        None => return Err(selector.invalid_write("empty selector")),
    };

    if tail.is_empty() {
        tree.insert(head.clone(), value);
        return Ok(());
    }

    // Work on a copy of the top-level entry so a failed write leaves the tree as it was.
    let mut slot = tree.get(head).cloned().unwrap_or(Value::Null);
    write_into(&mut slot, tail, value, selector)?;
    tree.insert(head.clone(), slot);
    Ok(())
}

fn write_into(
    slot: &mut Value,
    rest: &[Segment],
    value: Value,
    selector: &Selector,
) -> Result<(), TreeError> {
    let Some((head, tail)) = rest.split_first() else {
        *slot = value;
        return Ok(());
    };

    match head {
        Segment::Key(key) => {
            if slot.is_null() {
                *slot = Value::Object(Map::new());
            }
            let Value::Object(map) = slot else {
                return Err(selector.invalid_write(format!(
                    "cannot look up key '{}' in a {}",
                    key,
                    kind_name(slot)
                )));
            };
            let child = map.entry(key.clone()).or_insert(Value::Null);
            write_into(child, tail, value, selector)
        }
        Segment::Index(index) => {
            if slot.is_null() {
                *slot = Value::Array(Vec::new());
            }
            let Value::Array(items) = slot else {
                return Err(selector.invalid_write(format!(
                    "cannot index [{}] into a {}",
                    index,
                    kind_name(slot)
                )));
            };
            if *index > items.len() {
                return Err(selector.invalid_write(format!(
                    "index {} is out of bounds for an array of length {}",
                    index,
                    items.len()
                )));
            }
            if *index == items.len() {
                items.push(Value::Null);
            }
            write_into(&mut items[*index], tail, value, selector)
        }
        Segment::Length => Err(selector.invalid_write("cannot write to a length query")),
    }
}

/// Copy the node at `src_selector` in `src` to `dst_selector` in `dst`
///
/// A read failure is returned unchanged and `dst` is not touched.
pub fn copy(
    src: &Tree,
    src_selector: &Selector,
    dst: &mut Tree,
    dst_selector: &Selector,
) -> Result<(), TreeError> {
    let value = read(src, src_selector)?;
    write(dst, dst_selector, value)
}

/// True if `selector` resolves to a node in `tree`
pub fn exists(tree: &Tree, selector: &Selector) -> bool {
    read(tree, selector).is_ok()
}

/// Parse `selector` and read it
pub fn read_str(tree: &Tree, selector: &str) -> Result<Value, TreeError> {
    read(tree, &Selector::parse(selector)?)
}

/// Parse `selector` and write to it
pub fn write_str(tree: &mut Tree, selector: &str, value: Value) -> Result<(), TreeError> {
    write(tree, &Selector::parse(selector)?, value)
}

/// Parse both selectors and copy between them
pub fn copy_str(
    src: &Tree,
    src_selector: &str,
    dst: &mut Tree,
    dst_selector: &str,
) -> Result<(), TreeError> {
    let src_selector = Selector::parse(src_selector)?;
    let dst_selector = Selector::parse(dst_selector)?;
    copy(src, &src_selector, dst, &dst_selector)
}
