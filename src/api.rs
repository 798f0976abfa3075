//! REST-shaped request handlers over an [`InventoryStore`].
//!
//! Nothing here speaks HTTP. A transport hands over a method, a path and the
//! raw body, and gets back a status code plus the JSON [`Envelope`] to send.
//! Paths outside `/api/items` yield `None` so the transport can serve static
//! files or an SPA fallback instead.

use crate::error::Error;
use crate::item::Item;
use crate::store::InventoryStore;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

/// Route prefix owned by these handlers.
pub const ITEMS_ROUTE: &str = "/api/items";

/// The verbs the handlers understand. Anything else on an owned path is 405.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
    /// Any other verb.
    Other,
}

impl Method {
    /// Case-insensitive parse of an HTTP verb.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            _ => Method::Other,
        }
    }
}

/// Response body shared by every handler: `{isOk, data?, error?}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    /// `true` on success.
    #[serde(rename = "isOk")]
    pub is_ok: bool,
    /// Payload. `Some(Value::Null)` serializes as `"data": null`; `None`
    /// leaves the field out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Human-readable failure reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    fn ok(data: Option<Value>) -> Self {
        Self {
            is_ok: true,
            data,
            error: None,
        }
    }

    fn err(msg: impl Into<String>) -> Self {
        Self {
            is_ok: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Status code plus envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// HTTP status code.
    pub status: u16,
    /// JSON body.
    pub body: Envelope,
}

impl Reply {
    fn ok(data: Option<Value>) -> Self {
        Self {
            status: 200,
            body: Envelope::ok(data),
        }
    }

    fn fail(status: u16, msg: impl Into<String>) -> Self {
        Self {
            status,
            body: Envelope::err(msg),
        }
    }

    /// `true` for 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The envelope as a JSON string.
    pub fn body_json(&self) -> String {
        // an Envelope is plain JSON values and strings; encoding cannot fail
        serde_json::to_string(&self.body).unwrap_or_else(|_| r#"{"isOk":false}"#.to_string())
    }
}

impl From<Error> for Reply {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::Validation(_) => 400,
            Error::NotFound(_) => 404,
            _ => 500,
        };
        if status == 500 {
            warn!(error = %err, "request failed");
        }
        let msg = match &err {
            Error::NotFound(_) => "not found".to_string(),
            Error::Persistence(_) => "failed to save db".to_string(),
            other => other.to_string(),
        };
        Reply::fail(status, msg)
    }
}

/// Dispatch a request. Returns `None` when the path is not ours.
///
/// The query string and fragment are ignored, so a `backendId` containing `?`
/// or `#` could never be addressed; the store replaces such ids on load.
pub fn handle(store: &InventoryStore, method: Method, path: &str, body: &[u8]) -> Option<Reply> {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let rest = path.strip_prefix(ITEMS_ROUTE)?;

    let reply = if rest.is_empty() || rest == "/" {
        match method {
            Method::Get => list_items(store),
            Method::Post => create_item(store, body),
            _ => Reply::fail(405, "method not allowed"),
        }
    } else {
        // everything after the prefix is the id, slashes included
        let id = rest.strip_prefix('/')?;
        match method {
            Method::Put => update_item(store, id, body),
            Method::Delete => delete_item(store, id),
            _ => Reply::fail(405, "method not allowed"),
        }
    };
    Some(reply)
}

/// `GET /api/items`: reload from disk, then return every item.
pub fn list_items(store: &InventoryStore) -> Reply {
    match store.refresh() {
        Ok(()) => {
            let items = store.list().into_iter().map(Value::from).collect();
            Reply::ok(Some(Value::Array(items)))
        }
        Err(e) => e.into(),
    }
}

/// `POST /api/items`: body must be an object with `item_id` and `item_name`.
pub fn create_item(store: &InventoryStore, body: &[u8]) -> Reply {
    let item = match parse_object(body) {
        Ok(map) => Item::from(map),
        Err(reply) => return reply,
    };
    match store.append(item) {
        Ok(stored) => Reply::ok(Some(stored.into())),
        Err(e) => e.into(),
    }
}

/// `PUT /api/items/{backendId}`: shallow-merge the body into the item.
pub fn update_item(store: &InventoryStore, backend_id: &str, body: &[u8]) -> Reply {
    let patch = match parse_object(body) {
        Ok(map) => map,
        Err(reply) => return reply,
    };
    match store.merge_update(backend_id, &patch) {
        Ok(()) => Reply::ok(Some(Value::Null)),
        Err(e) => e.into(),
    }
}

/// `DELETE /api/items/{backendId}`.
pub fn delete_item(store: &InventoryStore, backend_id: &str) -> Reply {
    match store.remove(backend_id) {
        Ok(()) => Reply::ok(None),
        Err(e) => e.into(),
    }
}

fn parse_object(body: &[u8]) -> Result<Map<String, Value>, Reply> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(Reply::fail(400, "invalid json: expected an object")),
        Err(e) => Err(Reply::fail(400, format!("invalid json: {e}"))),
    }
}
