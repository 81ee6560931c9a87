//! Variable environments and override maps.
//!
//! Rendering works on a flat view of variables: every value is an opaque string
//! addressed by a dotted key such as `resources.requests.memory`. This module
//! owns that view and the conversions in and out of it:
//!
//! - [`OverrideMap`] - caller supplied, highest-precedence key/value pairs
//! - [`Environment`] - the resolved variable set handed to templates and scripts
//! - [`flatten_overlay`] - turns a value overlay document into dotted entries
//! - [`deep_merge_yaml`] - recursive mapping merge used by patch templates
//!
//! Keys are kept in a [`BTreeMap`] so iteration order, logging output and the
//! nested template context are identical across runs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use serde_yaml::Value;
use std::collections::{BTreeMap, HashMap};

use crate::templating::error::{ResolutionError, TemplateError};

/// Caller supplied overrides, applied after every other layer.
///
/// An override map is a plain value: attaching it to a
/// [`RenderingContext`](crate::render::RenderingContext) copies it, so two
/// contexts never observe each other's overrides.
///
/// # Examples
///
/// ```rust
/// use manifest_harness::values::OverrideMap;
///
/// let overrides = OverrideMap::from([
///     ("resources.requests.memory", "888Mi"),
///     ("resources.requests.cpu", "999m"),
/// ]);
/// assert_eq!(overrides.get("resources.requests.cpu"), Some("999m"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverrideMap(BTreeMap<String, String>);

impl OverrideMap {
    /// Create an empty override map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of this map with `key` set to `value`.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Return this map with every entry of `other` applied on top.
    #[must_use]
    pub fn merged(mut self, other: OverrideMap) -> Self {
        self.0.extend(other.0);
        self
    }

    /// The override for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OverrideMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for OverrideMap {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<String>, S> From<HashMap<K, V, S>> for OverrideMap {
    fn from(entries: HashMap<K, V, S>) -> Self {
        entries.into_iter().collect()
    }
}

impl From<BTreeMap<String, String>> for OverrideMap {
    fn from(entries: BTreeMap<String, String>) -> Self {
        Self(entries)
    }
}

/// The resolved variable set: dotted key to opaque string value.
///
/// An environment is produced fresh by every render and never shared, so the
/// mutating methods only ever touch a value owned by the current stage of the
/// pipeline. Script layers receive a shared reference and return a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    entries: BTreeMap<String, String>,
}

impl Environment {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a variable by its full dotted key.
    ///
    /// Keys are flat: `get("resources")` does not see `resources.requests.cpu`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use manifest_harness::values::Environment;
    ///
    /// let mut env = Environment::new();
    /// env.insert("resources.requests.cpu", "500m");
    /// assert_eq!(env.get("resources.requests.cpu"), Some("500m"));
    /// assert_eq!(env.get("resources"), None);
    /// ```
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Whether `key` is defined, even with an empty value.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Set `key`, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Remove `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Overwrite entries with every pair from `entries`, in order.
    pub fn extend<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in entries {
            self.entries.insert(key.into(), value.into());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Defined keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Build the nested object templates see.
    ///
    /// `resources.requests.cpu = 500m` becomes
    /// `{"resources": {"requests": {"cpu": "500m"}}}`. A key that is both a
    /// value and a namespace of another key (`image` and `image.tag`) cannot be
    /// represented and is reported as [`ResolutionError::ConflictingKeys`].
    pub fn to_nested_json(&self) -> Result<JsonValue, ResolutionError> {
        let mut root = Map::new();

        for (key, value) in &self.entries {
            let segments = split_key(key)?;
            let (leaf, parents) = match segments.split_last() {
                Some(parts) => parts,
                None => {
                    return Err(ResolutionError::InvalidKey {
                        key: key.clone(),
                    });
                }
            };

            let mut current = &mut root;
            for (depth, segment) in parents.iter().enumerate() {
                let slot = current
                    .entry((*segment).to_string())
                    .or_insert_with(|| JsonValue::Object(Map::new()));
                current = match slot {
                    JsonValue::Object(map) => map,
                    _ => {
                        return Err(ResolutionError::ConflictingKeys {
                            key: key.clone(),
                            other: parents[..=depth].join("."),
                        });
                    }
                };
            }

            if current.contains_key(*leaf) {
                return Err(ResolutionError::ConflictingKeys {
                    key: key.clone(),
                    other: format!("{}.*", key),
                });
            }
            current.insert((*leaf).to_string(), JsonValue::String(value.clone()));
        }

        Ok(JsonValue::Object(root))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut env = Self::new();
        env.extend(iter);
        env
    }
}

fn split_key(key: &str) -> Result<Vec<&str>, ResolutionError> {
    let segments: Vec<&str> = key.split('.').collect();
    if segments.iter().any(|s| s.trim().is_empty()) {
        return Err(ResolutionError::InvalidKey {
            key: key.to_string(),
        });
    }
    Ok(segments)
}

/// Textual form of a YAML scalar, or `None` for null and collections.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Flatten a value overlay document into dotted entries.
///
/// Nested mappings contribute their keys joined with `.`, prefixed by
/// `namespace` when one is given. Scalars become strings and `null` becomes
/// the empty string. Sequences have no dotted representation and are
/// rejected.
///
/// # Examples
///
/// ```rust
/// use manifest_harness::values::flatten_overlay;
///
/// let doc: serde_yaml::Value = serde_yaml::from_str("requests:\n  cpu: 500m\n").unwrap();
/// let entries = flatten_overlay("values.yml", &doc, Some("resources")).unwrap();
/// assert_eq!(entries, vec![("resources.requests.cpu".to_string(), "500m".to_string())]);
/// ```
pub fn flatten_overlay(
    template: &str,
    document: &Value,
    namespace: Option<&str>,
) -> Result<Vec<(String, String)>, TemplateError> {
    let mapping = match document {
        Value::Null => return Ok(Vec::new()),
        Value::Mapping(mapping) => mapping,
        _ => {
            return Err(TemplateError::OverlayNotMapping {
                template: template.to_string(),
            });
        }
    };

    let mut entries = Vec::new();
    let prefix = namespace.filter(|ns| !ns.is_empty()).map(str::to_string);
    flatten_into(template, mapping, prefix, &mut entries)?;
    Ok(entries)
}

fn flatten_into(
    template: &str,
    mapping: &serde_yaml::Mapping,
    prefix: Option<String>,
    entries: &mut Vec<(String, String)>,
) -> Result<(), TemplateError> {
    for (key, value) in mapping {
        let key_text = scalar_text(key).ok_or_else(|| TemplateError::UnsupportedValue {
            template: template.to_string(),
            key: prefix.clone().unwrap_or_default(),
            reason: "mapping keys must be scalars",
        })?;
        let full_key = match &prefix {
            Some(p) => format!("{}.{}", p, key_text),
            None => key_text,
        };

        match value {
            Value::Mapping(nested) => flatten_into(template, nested, Some(full_key), entries)?,
            Value::Sequence(_) => {
                return Err(TemplateError::UnsupportedValue {
                    template: template.to_string(),
                    key: full_key,
                    reason: "sequences cannot be expressed as dotted values",
                });
            }
            Value::Null => entries.push((full_key, String::new())),
            scalar => {
                // Tagged collections fall through scalar_text as None.
                let text = scalar_text(scalar).ok_or_else(|| TemplateError::UnsupportedValue {
                    template: template.to_string(),
                    key: full_key.clone(),
                    reason: "tagged collections are not supported",
                })?;
                entries.push((full_key, text));
            }
        }
    }
    Ok(())
}

/// Recursively merge `patch` into `base`.
///
/// Mappings merge key by key; for every other combination the patch value
/// replaces the base value, sequences included.
pub fn deep_merge_yaml(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (Value::Mapping(base_map), Value::Mapping(patch_map)) => {
            for (key, patch_value) in patch_map {
                let nested = patch_value.is_mapping() && base_map.get(key).is_some_and(Value::is_mapping);
                match base_map.get_mut(key) {
                    Some(base_value) if nested => deep_merge_yaml(base_value, patch_value),
                    _ => {
                        base_map.insert(key.clone(), patch_value.clone());
                    }
                }
            }
        }
        (base, patch) => *base = patch.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_override_map_later_entries_win() {
        let base = OverrideMap::from([("image", "a"), ("version", "1")]);
        let merged = base.merged(OverrideMap::from([("image", "b")]));
        assert_eq!(merged.get("image"), Some("b"));
        assert_eq!(merged.get("version"), Some("1"));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_override_map_from_hash_map() {
        let mut data = HashMap::new();
        data.insert("database.scheme", "postgresql");
        let overrides = OverrideMap::from(data);
        assert_eq!(overrides.get("database.scheme"), Some("postgresql"));
    }

    #[test]
    fn test_nested_json() {
        let env: Environment = [
            ("resources.requests.cpu", "500m"),
            ("resources.requests.memory", "512Mi"),
            ("image", "uaa"),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            env.to_nested_json().unwrap(),
            json!({
                "image": "uaa",
                "resources": { "requests": { "cpu": "500m", "memory": "512Mi" } }
            })
        );
    }

    #[test]
    fn test_nested_json_conflict() {
        let env: Environment = [("image", "uaa"), ("image.tag", "1.0")].into_iter().collect();
        match env.to_nested_json() {
            Err(ResolutionError::ConflictingKeys {
                key,
                other,
            }) => {
                assert_eq!(key, "image.tag");
                assert_eq!(other, "image");
            }
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_json_rejects_empty_segments() {
        let env: Environment = [("a..b", "x")].into_iter().collect();
        assert!(matches!(env.to_nested_json(), Err(ResolutionError::InvalidKey { .. })));
    }

    #[test]
    fn test_flatten_overlay_with_namespace() {
        let doc = yaml("scheme: hsqldb\nport: 5432\ntls:\n  enabled: false\nuser: ~\n");
        let entries = flatten_overlay("db.yml", &doc, Some("database")).unwrap();
        assert_eq!(
            entries,
            vec![
                ("database.scheme".to_string(), "hsqldb".to_string()),
                ("database.port".to_string(), "5432".to_string()),
                ("database.tls.enabled".to_string(), "false".to_string()),
                ("database.user".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_flatten_overlay_rejects_sequences() {
        let doc = yaml("profiles:\n  - default\n");
        let err = flatten_overlay("v.yml", &doc, None).unwrap_err();
        assert!(matches!(err, TemplateError::UnsupportedValue { ref key, .. } if key == "profiles"));
    }

    #[test]
    fn test_flatten_overlay_requires_mapping() {
        let err = flatten_overlay("v.yml", &yaml("just a string"), None).unwrap_err();
        assert!(matches!(err, TemplateError::OverlayNotMapping { .. }));
        assert!(flatten_overlay("v.yml", &Value::Null, None).unwrap().is_empty());
    }

    #[test]
    fn test_deep_merge_yaml() {
        let mut base = yaml("metadata:\n  name: uaa\n  labels:\n    a: '1'\nspec:\n  ports: [1, 2]\n");
        let patch = yaml("metadata:\n  labels:\n    b: '2'\nspec:\n  ports: [3]\n");
        deep_merge_yaml(&mut base, &patch);
        assert_eq!(
            base,
            yaml("metadata:\n  name: uaa\n  labels:\n    a: '1'\n    b: '2'\nspec:\n  ports: [3]\n")
        );
    }

    #[test]
    fn test_scalar_text() {
        assert_eq!(scalar_text(&yaml("42")), Some("42".to_string()));
        assert_eq!(scalar_text(&yaml("true")), Some("true".to_string()));
        assert_eq!(scalar_text(&yaml("~")), None);
        assert_eq!(scalar_text(&yaml("[1]")), None);
    }
}
