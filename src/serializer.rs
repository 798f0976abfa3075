//! Serialization layer for the `{"items": [...]}` document. Defaults to JSON
//! via serde_json.
//!
//! Implement [`Serializer`] if you need a different on-disk format.

use crate::error::{Error, Result};
use crate::item::Item;
use serde::Serialize;
use serde_json::Value;

/// Name of the array field holding every item.
pub const ITEMS_FIELD: &str = "items";

#[derive(Serialize)]
struct DocumentRef<'a> {
    items: &'a [Item],
}

/// Converts the item collection to/from bytes for persistence.
pub trait Serializer: Send + Sync {
    /// Encode the collection as a whole document.
    fn serialize(&self, items: &[Item]) -> Result<Vec<u8>>;

    /// Decode a document. Anything that is not an object with an array of
    /// objects under `items` is [`Error::CorruptStore`].
    fn deserialize(&self, bytes: &[u8]) -> Result<Vec<Item>>;
}

/// JSON serializer with optional pretty-printing.
#[derive(Debug, Clone, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    /// Compact JSON (single line, no extra whitespace).
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretty-printed JSON with two-space indentation.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Serializer for JsonSerializer {
    fn serialize(&self, items: &[Item]) -> Result<Vec<u8>> {
        let doc = DocumentRef { items };
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(&doc)
        } else {
            serde_json::to_vec(&doc)
        };
        bytes.map_err(|e| Error::Serialize(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Vec<Item>> {
        let root: Value = serde_json::from_slice(bytes)
            .map_err(|e| Error::CorruptStore(format!("not valid JSON: {e}")))?;
        let Value::Object(mut root) = root else {
            return Err(Error::CorruptStore("top level is not an object".into()));
        };
        let Some(Value::Array(raw)) = root.remove(ITEMS_FIELD) else {
            return Err(Error::CorruptStore(format!(
                "missing `{ITEMS_FIELD}` array"
            )));
        };
        raw.into_iter()
            .enumerate()
            .map(|(i, v)| {
                Item::try_from(v)
                    .map_err(|_| Error::CorruptStore(format!("items[{i}] is not an object")))
            })
            .collect()
    }
}
