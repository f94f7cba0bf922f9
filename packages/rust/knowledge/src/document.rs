//! The knowledge base document and its strict loaders.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use formfill_shared::{FormFillError, Result};

use crate::path::QueryPath;
use crate::resolve::{self, Resolution};

/// A JSON tree whose root is always an object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Document {
    root: Value,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Map::new())
    }
}

impl Document {
    pub fn new(map: Map<String, Value>) -> Self {
        Self {
            root: Value::Object(map),
        }
    }

    /// The empty document substituted when a source cannot be loaded.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Accept a decoded value; anything but an object is malformed.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self::new(map)),
            other => Err(FormFillError::malformed(format!(
                "root must be a JSON object, found {}",
                resolve::value_kind(&other)
            ))),
        }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let value: Value = serde_json::from_reader(reader)
            .map_err(|e| FormFillError::malformed(format!("invalid JSON: {e}")))?;
        Self::from_value(value)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| FormFillError::malformed(format!("invalid JSON: {e}")))?;
        Self::from_value(value)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| FormFillError::SourceUnavailable {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::from_reader(BufReader::new(file)).map_err(|e| match e {
            FormFillError::SourceMalformed { message } => {
                FormFillError::malformed(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }

    /// The whole tree.
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// Top-level entries.
    pub fn as_map(&self) -> &Map<String, Value> {
        match &self.root {
            Value::Object(map) => map,
            _ => unreachable!("document root is always an object"),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().get(key)
    }

    pub fn len(&self) -> usize {
        self.as_map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_map().is_empty()
    }

    pub fn resolve(&self, path: &QueryPath) -> Resolution<'_> {
        resolve::resolve_path(&self.root, path)
    }
}
