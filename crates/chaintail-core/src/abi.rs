//! ABI documents as returned by an interface registry.
//!
//! A document is kept as a list of raw JSON entries. Entries are interpreted
//! one at a time when an index is built, so a single malformed entry never
//! invalidates the rest of the document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A contract interface description: an ordered list of ABI JSON entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbiDocument(Vec<Value>);

impl AbiDocument {
    pub fn new(entries: Vec<Value>) -> Self {
        Self(entries)
    }

    /// The ABI of an address with no known interface.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Parse ABI JSON text.
    ///
    /// Accepts either a bare JSON array of entries or a compiler artifact
    /// object carrying the array under an `"abi"` key.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Array(entries) => Ok(Self(entries)),
            Value::Object(mut obj) => match obj.remove("abi") {
                Some(abi) => serde_json::from_value(abi),
                None => Err(serde::de::Error::custom("expected an ABI array or an object with an `abi` key")),
            },
            _ => Err(serde::de::Error::custom("expected an ABI array")),
        }
    }

    pub fn entries(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A single ABI entry (function, event, error, constructor, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbiEntry {
    /// Entry kind; the ABI JSON format defaults a missing `type` to `function`.
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    pub name: String,
    pub inputs: Vec<AbiParam>,
    #[serde(default)]
    pub anonymous: bool,
}

fn default_kind() -> String {
    "function".into()
}

impl AbiEntry {
    pub fn is_event(&self) -> bool {
        self.kind == "event"
    }
}

/// One input parameter of an ABI entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbiParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub indexed: bool,
    /// Members of a `tuple` type
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<AbiParam>,
}

impl AbiParam {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            indexed: false,
            components: Vec::new(),
        }
    }

    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }
}
