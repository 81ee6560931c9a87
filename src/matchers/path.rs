//! Paths into a rendered document, used both to locate nodes and to report
//! where a constraint failed.

use serde_yaml::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::values::scalar_text;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid field path '{path}': {reason}")]
pub struct PathError {
    pub path: String,
    pub reason: String,
}

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Mapping key.
    Key(String),
    /// Sequence position.
    Index(usize),
    /// First sequence element whose `field` equals `value`; shown as `[field=value]`.
    Select { field: String, value: String },
    /// Element of an unordered collection identified by `key_field`; shown as `[key]`.
    Entry { key_field: String, key: String },
}

/// A path such as `spec.template.spec.containers[name=uaa].image`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// The empty path, addressing the node itself.
    pub fn root() -> Self {
        Self::default()
    }

    /// Path made of mapping keys split on `.`; never fails.
    ///
    /// Use [`FieldPath::key`] to build paths whose keys contain dots, such as
    /// `app.kubernetes.io/name`.
    pub fn keys(dotted: &str) -> Self {
        Self {
            segments: dotted
                .split('.')
                .filter(|part| !part.is_empty())
                .map(|part| Segment::Key(part.to_string()))
                .collect(),
        }
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self {
            segments,
        }
    }

    /// Parse `a.b[0].c[name=uaa]`.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let error = |reason: &str| PathError {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut rest = path.trim();
        let mut expect_key = true;

        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('[') {
                let end = after.find(']').ok_or_else(|| error("unclosed '['"))?;
                let inner = after[..end].trim();
                let segment = match inner.split_once('=') {
                    Some((field, value)) if !field.trim().is_empty() => Segment::Select {
                        field: field.trim().to_string(),
                        value: value.trim().to_string(),
                    },
                    Some(_) => return Err(error("selector needs a field name")),
                    None => Segment::Index(
                        inner.parse().map_err(|_| error("expected an index or field=value"))?,
                    ),
                };
                segments.push(segment);
                rest = &after[end + 1..];
                expect_key = false;
            } else if let Some(after) = rest.strip_prefix('.') {
                if expect_key {
                    return Err(error("empty key"));
                }
                rest = after;
                expect_key = true;
            } else {
                if !expect_key {
                    return Err(error("expected '.' or '[' between segments"));
                }
                let end = rest.find(['.', '[']).unwrap_or(rest.len());
                segments.push(Segment::Key(rest[..end].to_string()));
                rest = &rest[end..];
                expect_key = false;
            }
        }

        if expect_key && !segments.is_empty() {
            return Err(error("trailing '.'"));
        }
        Ok(Self {
            segments,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// This path extended by a single mapping key, which may contain dots.
    #[must_use]
    pub fn key(&self, key: impl Into<String>) -> Self {
        self.child(Segment::Key(key.into()))
    }

    #[must_use]
    pub fn child(&self, segment: Segment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self {
            segments,
        }
    }

    #[must_use]
    pub fn join(&self, other: &FieldPath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self {
            segments,
        }
    }

    /// The first `len` segments.
    #[must_use]
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            segments: self.segments[..len.min(self.segments.len())].to_vec(),
        }
    }

    /// Walk `node` along this path.
    ///
    /// On failure returns the index of the segment that could not be followed.
    pub fn resolve<'a>(&self, node: &'a Value) -> Result<&'a Value, usize> {
        let mut current = node;
        for (idx, segment) in self.segments.iter().enumerate() {
            let next = match segment {
                Segment::Key(key) => current.as_mapping().and_then(|m| m.get(key.as_str())),
                Segment::Index(i) => current.as_sequence().and_then(|s| s.get(*i)),
                Segment::Select {
                    field,
                    value,
                }
                | Segment::Entry {
                    key_field: field,
                    key: value,
                } => find_element(current, field, value),
            };
            current = next.ok_or(idx)?;
        }
        Ok(current)
    }
}

/// First element of a sequence whose `field` has the scalar text `value`.
pub(crate) fn find_element<'a>(node: &'a Value, field: &str, value: &str) -> Option<&'a Value> {
    node.as_sequence()?
        .iter()
        .find(|item| item.get(field).and_then(scalar_text).as_deref() == Some(value))
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parsed with [`FieldPath::parse`], so `containers[0].image` and
/// `containers[name=uaa]` work in builder arguments. Text that does not parse
/// falls back to [`FieldPath::keys`] and then resolves to nothing.
impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self::parse(path).unwrap_or_else(|_| Self::keys(path))
    }
}

impl From<String> for FieldPath {
    fn from(path: String) -> Self {
        Self::from(path.as_str())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("<root>");
        }
        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) if idx == 0 => write!(f, "{}", key)?,
                Segment::Key(key) => write!(f, ".{}", key)?,
                Segment::Index(i) => write!(f, "[{}]", i)?,
                Segment::Select {
                    field,
                    value,
                } => write!(f, "[{}={}]", field, value)?,
                Segment::Entry {
                    key,
                    ..
                } => write!(f, "[{}]", key)?,
            }
        }
        Ok(())
    }
}
