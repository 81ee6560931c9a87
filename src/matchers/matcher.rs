//! Generic constraint tree and its evaluator.

use serde_yaml::{Mapping, Value};

use super::error::{MatchError, MatchResult};
use super::path::{FieldPath, Segment, find_element};
use crate::render::RenderedDocument;
use crate::values::scalar_text;

/// What the node at a constraint's path must look like.
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    /// Equal to the value. Scalars compare by text, mappings ignore key order.
    Equals(Value),
    /// A scalar whose text contains the substring.
    Contains(String),
    /// A mapping holding at least these entries.
    Subset(Mapping),
    /// A sequence with an element whose `key_field` is `key` and whose
    /// `value_field` equals `value`, at any position.
    Entry {
        key_field: String,
        key: String,
        value_field: String,
        value: Value,
    },
    /// A node satisfying the nested matcher.
    Matches(Matcher),
}

/// How a [`Constraint::Lookup`] picks an element of a sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// The first element whose `field` has the scalar text `value`.
    FieldEquals { field: String, value: String },
    /// Any element that satisfies the child matcher.
    Any,
}

impl Selector {
    pub fn field_equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::FieldEquals {
            field: field.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// The node at `path`, relative to the current node, meets `expectation`.
    FixedPath { path: FieldPath, expectation: Expectation },
    /// The sequence at `path` has an element picked by `selector` that
    /// satisfies `matcher`.
    Lookup { path: FieldPath, selector: Selector, matcher: Matcher },
}

/// An ordered list of constraints over a node.
///
/// Builder methods take `self` and return the extended matcher, so a partly
/// built matcher can be cloned and specialised without affecting the original.
///
/// ```rust
/// use manifest_harness::matchers::{FieldPath, Matcher, Selector};
///
/// let container = Matcher::new().with_field_containing("image", "cfidentity/uaa@sha256:");
/// let pod = Matcher::new().with_lookup(
///     FieldPath::keys("spec.containers"),
///     Selector::field_equals("name", "uaa"),
///     container,
/// );
/// assert_eq!(pod.constraints().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Matcher {
    constraints: Vec<Constraint>,
}

impl Matcher {
    /// A matcher with no constraints; it accepts any node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Constraints in the order they are evaluated.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Append a constraint; it runs after every constraint added before it.
    #[must_use]
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    #[must_use]
    pub fn with_expectation(self, path: impl Into<FieldPath>, expectation: Expectation) -> Self {
        self.with_constraint(Constraint::FixedPath {
            path: path.into(),
            expectation,
        })
    }

    /// Require the node at `path` to equal `value`.
    ///
    /// Scalars compare by their text, so `with_field("spec.replicas", "3")`
    /// accepts a rendered `3`. Paths accept index and selector segments:
    ///
    /// ```rust
    /// use manifest_harness::matchers::Matcher;
    ///
    /// let doc = serde_yaml::from_str("containers:\n  - name: uaa\n    ports:\n      - containerPort: 8080\n").unwrap();
    /// let matcher = Matcher::new().with_field("containers[name=uaa].ports[0].containerPort", "8080");
    /// assert!(matcher.evaluate_node(&doc).is_ok());
    /// ```
    #[must_use]
    pub fn with_field(self, path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        self.with_expectation(path, Expectation::Equals(value.into()))
    }

    /// Require the scalar at `path` to contain `substring`.
    #[must_use]
    pub fn with_field_containing(self, path: impl Into<FieldPath>, substring: impl Into<String>) -> Self {
        self.with_expectation(path, Expectation::Contains(substring.into()))
    }

    /// Require the mapping at `path` to hold at least `entries`.
    #[must_use]
    pub fn with_subset<I, K, V>(self, path: impl Into<FieldPath>, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        let subset = entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self.with_expectation(path, Expectation::Subset(subset))
    }

    /// Require an element of an unordered collection, such as a container's
    /// `env` list keyed by `name` with its `value`.
    #[must_use]
    pub fn with_entry(
        self,
        path: impl Into<FieldPath>,
        key_field: impl Into<String>,
        key: impl Into<String>,
        value_field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.with_expectation(
            path,
            Expectation::Entry {
                key_field: key_field.into(),
                key: key.into(),
                value_field: value_field.into(),
                value: value.into(),
            },
        )
    }

    /// Apply `matcher` to the node at `path`.
    #[must_use]
    pub fn with_child(self, path: impl Into<FieldPath>, matcher: Matcher) -> Self {
        self.with_expectation(path, Expectation::Matches(matcher))
    }

    /// Apply `matcher` to the element of the sequence at `path` picked by
    /// `selector`. A missing element is reported as not found.
    #[must_use]
    pub fn with_lookup(self, path: impl Into<FieldPath>, selector: Selector, matcher: Matcher) -> Self {
        self.with_constraint(Constraint::Lookup {
            path: path.into(),
            selector,
            matcher,
        })
    }

    /// Evaluate against an arbitrary node, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// [`MatchError::NotFound`] when a path or looked-up element is absent,
    /// [`MatchError::Mismatch`] when a value differs.
    pub fn evaluate_node(&self, node: &Value) -> MatchResult {
        self.evaluate_at(node, &FieldPath::root())
    }

    fn evaluate_at(&self, node: &Value, at: &FieldPath) -> MatchResult {
        for constraint in &self.constraints {
            match constraint {
                Constraint::FixedPath {
                    path,
                    expectation,
                } => {
                    let target = locate(node, at, path)?;
                    check(expectation, target, &at.join(path))?;
                }
                Constraint::Lookup {
                    path,
                    selector,
                    matcher,
                } => {
                    let collection = locate(node, at, path)?;
                    lookup(collection, &at.join(path), selector, matcher)?;
                }
            }
        }
        Ok(())
    }
}

/// Evaluate `matcher` against the sequence of documents in `document`.
pub fn evaluate(matcher: &Matcher, document: &RenderedDocument) -> MatchResult {
    let result = matcher.evaluate_node(document.root());
    if let Err(error) = &result {
        tracing::debug!("Match failed: {}", error);
    }
    result
}

fn locate<'a>(node: &'a Value, at: &FieldPath, path: &FieldPath) -> Result<&'a Value, MatchError> {
    path.resolve(node).map_err(|idx| {
        let what = match &path.segments()[idx] {
            Segment::Key(key) => format!("field '{}'", key),
            Segment::Index(i) => format!("element {}", i),
            Segment::Select {
                field,
                value,
            } => format!("element with {}={}", field, value),
            Segment::Entry {
                key,
                ..
            } => format!("entry '{}'", key),
        };
        MatchError::NotFound {
            path: at.join(&path.prefix(idx + 1)),
            what,
        }
    })
}

fn lookup(collection: &Value, at: &FieldPath, selector: &Selector, matcher: &Matcher) -> MatchResult {
    let Some(elements) = collection.as_sequence() else {
        return Err(mismatch(at, "a sequence".to_string(), collection));
    };

    match selector {
        Selector::FieldEquals {
            field,
            value,
        } => {
            let path = at.child(Segment::Select {
                field: field.clone(),
                value: value.clone(),
            });
            let element = find_element(collection, field, value).ok_or_else(|| MatchError::NotFound {
                path: path.clone(),
                what: format!("element with {}={}", field, value),
            })?;
            matcher.evaluate_at(element, &path)
        }
        Selector::Any => {
            let mut first_error = None;
            for (idx, element) in elements.iter().enumerate() {
                match matcher.evaluate_at(element, &at.child(Segment::Index(idx))) {
                    Ok(()) => return Ok(()),
                    Err(error) => {
                        first_error.get_or_insert(error);
                    }
                }
            }
            match first_error {
                Some(error) if elements.len() == 1 => Err(error),
                _ => Err(MatchError::NotFound {
                    path: at.clone(),
                    what: format!("element satisfying all constraints among {} candidate(s)", elements.len()),
                }),
            }
        }
    }
}

fn check(expectation: &Expectation, actual: &Value, at: &FieldPath) -> MatchResult {
    match expectation {
        Expectation::Equals(expected) => {
            if values_equal(actual, expected) {
                Ok(())
            } else {
                Err(mismatch(at, describe(expected), actual))
            }
        }
        Expectation::Contains(substring) => match scalar_text(actual) {
            Some(text) if text.contains(substring.as_str()) => Ok(()),
            _ => Err(mismatch(at, format!("a value containing {:?}", substring), actual)),
        },
        Expectation::Subset(expected) => check_subset(expected, actual, at),
        Expectation::Entry {
            key_field,
            key,
            value_field,
            value,
        } => {
            if !actual.is_sequence() {
                return Err(mismatch(at, "a sequence".to_string(), actual));
            }
            let path = at.child(Segment::Entry {
                key_field: key_field.clone(),
                key: key.clone(),
            });
            let entry = find_element(actual, key_field, key).ok_or_else(|| MatchError::NotFound {
                path: path.clone(),
                what: format!("entry '{}'", key),
            })?;
            let found = entry.get(value_field.as_str()).ok_or_else(|| MatchError::NotFound {
                path: path.clone(),
                what: format!("field '{}'", value_field),
            })?;
            if values_equal(found, value) {
                Ok(())
            } else {
                Err(mismatch(&path, describe(value), found))
            }
        }
        Expectation::Matches(matcher) => matcher.evaluate_at(actual, at),
    }
}

fn check_subset(expected: &Mapping, actual: &Value, at: &FieldPath) -> MatchResult {
    let Some(mapping) = actual.as_mapping() else {
        return Err(mismatch(at, describe(&Value::Mapping(expected.clone())), actual));
    };
    for (key, want) in expected {
        let key_text = scalar_text(key).unwrap_or_else(|| describe(key));
        let path = at.key(key_text.clone());
        let got = lookup_key(mapping, key).ok_or_else(|| MatchError::NotFound {
            path: path.clone(),
            what: format!("key '{}'", key_text),
        })?;
        match want {
            Value::Mapping(nested) => check_subset(nested, got, &path)?,
            _ if values_equal(got, want) => {}
            _ => return Err(mismatch(&path, describe(want), got)),
        }
    }
    Ok(())
}

/// Mapping lookup that treats `1` and `"1"` as the same key.
fn lookup_key<'a>(mapping: &'a Mapping, key: &Value) -> Option<&'a Value> {
    mapping.get(key).or_else(|| {
        let text = scalar_text(key)?;
        mapping
            .iter()
            .find(|(k, _)| scalar_text(k).as_deref() == Some(text.as_str()))
            .map(|(_, v)| v)
    })
}

/// Structural equality on text forms: `2 == "2"`, mapping order ignored.
pub(crate) fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Null, Value::Null) => true,
        (Value::Mapping(a), Value::Mapping(e)) => {
            a.len() == e.len()
                && e.iter().all(|(k, v)| lookup_key(a, k).is_some_and(|found| values_equal(found, v)))
        }
        (Value::Sequence(a), Value::Sequence(e)) => {
            a.len() == e.len() && a.iter().zip(e).all(|(x, y)| values_equal(x, y))
        }
        (Value::Tagged(a), Value::Tagged(e)) => a.tag == e.tag && values_equal(&a.value, &e.value),
        _ => match (scalar_text(actual), scalar_text(expected)) {
            (Some(a), Some(e)) => a == e,
            _ => false,
        },
    }
}

fn mismatch(at: &FieldPath, expected: String, actual: &Value) -> MatchError {
    MatchError::Mismatch {
        path: at.clone(),
        expected,
        actual: describe(actual),
    }
}

/// Compact single-line rendering for diagnostics.
fn describe(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("{:?}", value))
}
