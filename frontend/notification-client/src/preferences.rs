/// Key-value preference store
///
/// Holds the few values that outlive a page session: the stable customer id
/// and the notification sound toggle. No transactional guarantees; the last
/// write wins.
use crate::error::Result;
use event_schema::keys;
use rand::Rng;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::info;

const CUSTOMER_ID_PREFIX: &str = "customer_";
const CUSTOMER_ID_SUFFIX_LEN: usize = 13;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// In-memory store, lost on drop
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON file store; the whole map is rewritten on every `set`
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    values: RwLock<HashMap<String, String>>,
}

impl FilePreferenceStore {
    /// Open (or lazily create) the store at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = match std::fs::read_to_string(&path) {
            Ok(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw)?,
            Ok(_) => HashMap::new(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        let raw = serde_json::to_string_pretty(&*values)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

/// Stable customer id, generated and persisted on first use
pub fn customer_id(store: &dyn PreferenceStore) -> Result<String> {
    if let Some(id) = store.get(keys::CUSTOMER_ID).filter(|id| !id.is_empty()) {
        return Ok(id);
    }

    let id = generate_customer_id();
    store.set(keys::CUSTOMER_ID, &id)?;
    info!(customer_id = %id, "Generated new customer ID");
    Ok(id)
}

pub fn generate_customer_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..CUSTOMER_ID_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}{}", CUSTOMER_ID_PREFIX, suffix)
}

/// Sound toggle; anything other than a stored `"false"` keeps sound on
pub fn sound_enabled(store: &dyn PreferenceStore) -> bool {
    match store.get(keys::SOUND_ENABLED) {
        Some(value) => value == "true",
        None => true,
    }
}

pub fn set_sound_enabled(store: &dyn PreferenceStore, enabled: bool) -> Result<()> {
    store.set(keys::SOUND_ENABLED, if enabled { "true" } else { "false" })
}
