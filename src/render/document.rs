//! The structured result of a render.

use serde::Deserialize;
use serde_yaml::Value;
use std::fmt;

use crate::templating::error::TemplateError;

/// Separator written between documents.
pub const DOCUMENT_SEPARATOR: &str = "---\n";

/// Zero or more YAML documents, in the order they were rendered.
///
/// Mappings keep their insertion order, which shows up in diagnostics but has
/// no effect on matching. A rendered document is never modified after the
/// render that produced it returns.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    /// Always a sequence: one element per document.
    root: Value,
}

impl RenderedDocument {
    pub fn from_documents(documents: Vec<Value>) -> Self {
        Self {
            root: Value::Sequence(documents),
        }
    }

    /// Parse text holding `---` separated documents. Empty documents are skipped.
    pub fn parse(template: &str, text: &str) -> Result<Self, TemplateError> {
        Ok(Self::from_documents(parse_documents(template, text)?))
    }

    pub fn documents(&self) -> &[Value] {
        match &self.root {
            Value::Sequence(documents) => documents,
            _ => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.documents().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents().is_empty()
    }

    /// First document whose `kind` equals `kind`.
    pub fn find_by_kind(&self, kind: &str) -> Option<&Value> {
        self.documents()
            .iter()
            .find(|doc| doc.get("kind").and_then(Value::as_str) == Some(kind))
    }

    /// All documents as YAML text, separated by `---`.
    pub fn to_yaml_string(&self) -> Result<String, serde_yaml::Error> {
        let mut output = String::new();
        for (idx, document) in self.documents().iter().enumerate() {
            if idx > 0 {
                output.push_str(DOCUMENT_SEPARATOR);
            }
            output.push_str(&serde_yaml::to_string(document)?);
        }
        Ok(output)
    }

    /// The document list as one sequence node, the root matchers walk.
    pub(crate) fn root(&self) -> &Value {
        &self.root
    }
}

impl fmt::Display for RenderedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_yaml_string() {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, "{:?}", self.root),
        }
    }
}

/// Split rendered text into its non-empty documents.
pub(crate) fn parse_documents(template: &str, text: &str) -> Result<Vec<Value>, TemplateError> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = Value::deserialize(document).map_err(|e| TemplateError::InvalidYaml {
            template: template.to_string(),
            message: e.to_string(),
        })?;
        if !value.is_null() {
            documents.push(value);
        }
    }
    Ok(documents)
}
