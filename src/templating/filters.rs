//! Custom Tera filters available to templates and script layers.
//!
//! - `sha256`: hex-encoded SHA-256 digest of a string, used to derive
//!   content-addressed references such as `repo@sha256:{{ manifest | sha256 }}`

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tera::{Tera, Value};

/// Register every custom filter on a Tera instance.
pub fn register(tera: &mut Tera) {
    tera.register_filter("sha256", sha256_filter);
}

fn sha256_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let input = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => {
            return Err(tera::Error::msg(format!(
                "Filter `sha256` expects a string, got {}",
                other
            )));
        }
    };
    Ok(Value::String(hex::encode(Sha256::digest(input.as_bytes()))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tera::Context;

    #[test]
    fn test_sha256_filter() {
        let mut tera = Tera::default();
        register(&mut tera);

        let mut context = Context::new();
        context.insert("manifest", "hello");
        let rendered = tera.render_str("{{ manifest | sha256 }}", &context).unwrap();
        assert_eq!(rendered, "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824");
    }

    #[test]
    fn test_sha256_filter_rejects_objects() {
        let result = sha256_filter(&serde_json::json!({"a": 1}), &HashMap::new());
        assert!(result.is_err());
    }
}
