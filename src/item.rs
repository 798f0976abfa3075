//! Inventory item records.
//!
//! An [`Item`] is an open JSON object. The store only cares about a handful of
//! well-known fields; everything else is carried through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Server-assigned identity field, the only key used for addressing.
pub const BACKEND_ID: &str = "backendId";
/// Caller-supplied stock-keeping id. Not unique.
pub const ITEM_ID: &str = "item_id";
/// Display name, required on creation.
pub const ITEM_NAME: &str = "item_name";
/// Creation time in Unix seconds.
pub const TIMESTAMP: &str = "timestamp";

/// One inventory record. Field order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item(Map<String, Value>);

impl Item {
    /// Empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter, handy in tests and demos.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// The `backendId`, if present and a string.
    pub fn backend_id(&self) -> Option<&str> {
        self.0.get(BACKEND_ID).and_then(Value::as_str)
    }

    /// The `item_name`, if present and a string.
    pub fn item_name(&self) -> Option<&str> {
        self.0.get(ITEM_NAME).and_then(Value::as_str)
    }

    /// The `item_id`, if present and a string.
    pub fn item_id(&self) -> Option<&str> {
        self.0.get(ITEM_ID).and_then(Value::as_str)
    }

    /// Raw field access.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// `true` if the field is present (any value, including `null`).
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Set a field, returning its previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    pub(crate) fn set_backend_id(&mut self, id: String) {
        self.0.insert(BACKEND_ID.to_string(), Value::String(id));
    }

    /// Shallow merge: every field in `patch` overwrites the stored one, except
    /// `backendId`, which is never touched. Returns the fields it replaced
    /// (`None` for fields that did not exist) so the change can be undone.
    pub fn merge(&mut self, patch: &Map<String, Value>) -> Vec<(String, Option<Value>)> {
        patch
            .iter()
            .filter(|(k, _)| k.as_str() != BACKEND_ID)
            .map(|(k, v)| (k.clone(), self.0.insert(k.clone(), v.clone())))
            .collect()
    }

    /// Reverse a [`merge`](Self::merge) using the list it returned.
    pub(crate) fn unmerge(&mut self, undo: Vec<(String, Option<Value>)>) {
        for (k, old) in undo.into_iter().rev() {
            match old {
                Some(v) => {
                    self.0.insert(k, v);
                }
                None => {
                    self.0.shift_remove(&k);
                }
            }
        }
    }

    /// Borrow the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Unwrap into the underlying JSON object.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Item {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Item> for Value {
    fn from(item: Item) -> Self {
        Value::Object(item.0)
    }
}

impl TryFrom<Value> for Item {
    type Error = Value;

    /// Only JSON objects are items; anything else is handed back.
    fn try_from(value: Value) -> std::result::Result<Self, Value> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}
