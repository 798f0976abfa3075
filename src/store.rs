//! Core store type and builder.

use crate::error::{Error, Result};
use crate::id::IdGenerator;
use crate::item::{Item, ITEM_ID, ITEM_NAME, TIMESTAMP};
use crate::persist;
use crate::serializer::{JsonSerializer, Serializer};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// What [`InventoryStoreBuilder::build`] does with a file that exists but is
/// not a valid `{"items": [...]}` document.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CorruptPolicy {
    /// Refuse to open with [`Error::CorruptStore`]. The file is left alone.
    #[default]
    Fail,
    /// Move the bad file to `<path>.corrupt-<millis>` and start empty.
    Reset,
}

/// Inventory items kept in one JSON document on disk.
///
/// Every operation takes a single mutex for its whole duration, file I/O
/// included, so operations are totally ordered and a mutation has hit the disk
/// before it returns `Ok`. A failed write rolls the in-memory change back.
///
/// Share it between request handlers with an `Arc`.
pub struct InventoryStore {
    items: Mutex<Vec<Item>>,
    path: PathBuf,
    serializer: JsonSerializer,
    ids: IdGenerator,
}

impl InventoryStore {
    /// Open (or create) a store at `path` with pretty JSON and
    /// [`CorruptPolicy::Fail`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder(path).build()
    }

    /// Start configuring a new store. Call
    /// [`.build()`](InventoryStoreBuilder::build) when ready.
    pub fn builder(path: impl AsRef<Path>) -> InventoryStoreBuilder {
        InventoryStoreBuilder::new(path)
    }

    // ---- reads ----

    /// Snapshot of all items in insertion order. No disk I/O; call
    /// [`refresh`](Self::refresh) first if another process may have written.
    #[must_use]
    pub fn list(&self) -> Vec<Item> {
        self.items.lock().clone()
    }

    /// The item with this exact `backendId`.
    #[must_use]
    pub fn get(&self, backend_id: &str) -> Option<Item> {
        self.items
            .lock()
            .iter()
            .find(|it| it.backend_id() == Some(backend_id))
            .cloned()
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// `true` when the store holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Path to the backing JSON file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reload from disk, replacing the in-memory collection.
    ///
    /// A missing file is recreated from the empty document. A corrupt file is
    /// reported and the in-memory items are kept as they were.
    pub fn refresh(&self) -> Result<()> {
        let mut items = self.items.lock();
        match persist::read(&self.path)? {
            None => {
                warn!(path = %self.path.display(), "store file vanished, recreating empty");
                self.write(&[])?;
                items.clear();
            }
            Some(bytes) => {
                let (loaded, repaired) = self.decode(&bytes)?;
                if repaired {
                    self.write(&loaded)?;
                }
                *items = loaded;
            }
        }
        debug!(items = items.len(), "refreshed from disk");
        Ok(())
    }

    // ---- writes ----

    /// Add a new item at the end and return it as stored.
    ///
    /// `item_id` and `item_name` must be present. A fresh `backendId` always
    /// replaces whatever the caller sent; `timestamp` is filled in only if
    /// missing.
    pub fn append(&self, mut item: Item) -> Result<Item> {
        for field in [ITEM_ID, ITEM_NAME] {
            if !item.contains(field) {
                return Err(Error::Validation(format!("missing field `{field}`")));
            }
        }

        let mut items = self.items.lock();
        let id = self.fresh_id(&items);
        item.set_backend_id(id.clone());
        if !item.contains(TIMESTAMP) {
            item.insert(TIMESTAMP, chrono::Utc::now().timestamp());
        }

        items.push(item);
        if let Err(e) = self.write(&items) {
            items.pop();
            return Err(e);
        }
        debug!(backend_id = %id, "appended item");
        Ok(items[items.len() - 1].clone())
    }

    /// Shallow-merge `patch` into the item with this `backendId`. Fields not in
    /// the patch stay as they are; `backendId` in the patch is ignored.
    pub fn merge_update(&self, backend_id: &str, patch: &Map<String, Value>) -> Result<()> {
        let mut items = self.items.lock();
        let idx = position(&items, backend_id)?;

        let undo = items[idx].merge(patch);
        if let Err(e) = self.write(&items) {
            items[idx].unmerge(undo);
            return Err(e);
        }
        debug!(backend_id, fields = patch.len(), "merged update");
        Ok(())
    }

    /// Delete the item with this `backendId`. The rest keep their order.
    pub fn remove(&self, backend_id: &str) -> Result<()> {
        let mut items = self.items.lock();
        let idx = position(&items, backend_id)?;

        let removed = items.remove(idx);
        if let Err(e) = self.write(&items) {
            items.insert(idx, removed);
            return Err(e);
        }
        debug!(backend_id, "removed item");
        Ok(())
    }

    // ---- internal ----

    fn write(&self, items: &[Item]) -> Result<()> {
        let bytes = self.serializer.serialize(items)?;
        persist::replace(&self.path, &bytes).map_err(|e| {
            error!(path = %self.path.display(), error = %e, "failed to persist store");
            e
        })
    }

    fn fresh_id(&self, items: &[Item]) -> String {
        loop {
            let id = self.ids.next();
            if items.iter().all(|it| it.backend_id() != Some(id.as_str())) {
                return id;
            }
        }
    }

    /// Decode a document and give every item a usable, unique `backendId`:
    /// missing, empty, duplicate or unroutable ids are replaced.
    /// The flag says whether anything had to be fixed.
    fn decode(&self, bytes: &[u8]) -> Result<(Vec<Item>, bool)> {
        if bytes.is_empty() {
            return Ok((Vec::new(), false));
        }
        let mut items = self.serializer.deserialize(bytes)?;

        let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
        let mut bad = Vec::new();
        for (i, item) in items.iter().enumerate() {
            match item.backend_id() {
                Some(id) if routable(id) && seen.insert(id.to_string()) => {}
                _ => bad.push(i),
            }
        }
        for &i in &bad {
            let id = loop {
                let id = self.ids.next();
                if seen.insert(id.clone()) {
                    break id;
                }
            };
            warn!(index = i, backend_id = %id, "item had no usable backendId, assigned one");
            items[i].set_backend_id(id);
        }
        Ok((items, !bad.is_empty()))
    }
}

/// Non-empty and free of `?`/`#`, which a request path would cut off.
fn routable(id: &str) -> bool {
    !id.is_empty() && !id.contains(['?', '#'])
}

fn position(items: &[Item], backend_id: &str) -> Result<usize> {
    items
        .iter()
        .position(|it| it.backend_id() == Some(backend_id))
        .ok_or_else(|| Error::NotFound(backend_id.to_string()))
}

impl std::fmt::Debug for InventoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryStore")
            .field("path", &self.path)
            .field("serializer", &self.serializer)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Configures and opens an [`InventoryStore`].
///
/// ```rust,no_run
/// use inventory_store::{CorruptPolicy, InventoryStore};
///
/// let store = InventoryStore::builder("db.json")
///     .pretty(false)
///     .on_corrupt(CorruptPolicy::Reset)
///     .build()
///     .unwrap();
/// ```
pub struct InventoryStoreBuilder {
    path: PathBuf,
    pretty: bool,
    on_corrupt: CorruptPolicy,
}

impl InventoryStoreBuilder {
    fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            pretty: true,
            on_corrupt: CorruptPolicy::default(),
        }
    }

    /// Write human-readable JSON with indentation (default: `true`).
    pub fn pretty(mut self, yes: bool) -> Self {
        self.pretty = yes;
        self
    }

    /// What to do if the file is corrupt (default: [`CorruptPolicy::Fail`]).
    pub fn on_corrupt(mut self, policy: CorruptPolicy) -> Self {
        self.on_corrupt = policy;
        self
    }

    /// Load (or create) the store.
    pub fn build(self) -> Result<InventoryStore> {
        if self.path.as_os_str().is_empty() {
            return Err(Error::Config("store path is empty".into()));
        }
        let serializer = if self.pretty {
            JsonSerializer::pretty()
        } else {
            JsonSerializer::new()
        };
        let store = InventoryStore {
            items: Mutex::new(Vec::new()),
            path: self.path,
            serializer,
            ids: IdGenerator::new(),
        };

        let items = match persist::read(&store.path)? {
            None => {
                info!(path = %store.path.display(), "no store file, initializing empty");
                store.write(&[])?;
                Vec::new()
            }
            Some(bytes) => match store.decode(&bytes) {
                Ok((items, repaired)) => {
                    if repaired {
                        store.write(&items)?;
                    }
                    items
                }
                Err(Error::CorruptStore(reason)) if self.on_corrupt == CorruptPolicy::Reset => {
                    let aside = quarantine(&store.path)?;
                    error!(
                        path = %store.path.display(),
                        moved_to = %aside.display(),
                        %reason,
                        "store file is corrupt, starting empty"
                    );
                    store.write(&[])?;
                    Vec::new()
                }
                Err(e) => {
                    error!(path = %store.path.display(), error = %e, "refusing to open store");
                    return Err(e);
                }
            },
        };

        info!(path = %store.path.display(), items = items.len(), "store opened");
        *store.items.lock() = items;
        Ok(store)
    }
}

impl std::fmt::Debug for InventoryStoreBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryStoreBuilder")
            .field("path", &self.path)
            .field("pretty", &self.pretty)
            .field("on_corrupt", &self.on_corrupt)
            .finish()
    }
}

/// Rename a corrupt store file out of the way, keeping its bytes.
fn quarantine(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "store".into());
    let aside = path.with_file_name(format!(
        "{name}.corrupt-{}",
        chrono::Utc::now().timestamp_millis()
    ));
    std::fs::rename(path, &aside).map_err(|e| Error::Persistence(e.to_string()))?;
    Ok(aside)
}
