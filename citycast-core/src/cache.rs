//! Persistent location cache.
//!
//! The storage backend is a plain string key-value store so tests can run
//! against memory and the CLI against a directory on disk.

use std::{
    collections::HashMap,
    fs, io,
    path::PathBuf,
    sync::Arc,
};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{error::ForecastError, model::LocationRecord};

const KEY_PREFIX: &str = "city_";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> io::Result<Option<String>>;
    fn put(&self, key: &str, value: &str) -> io::Result<()>;
    fn keys(&self) -> io::Result<Vec<String>>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> io::Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn keys(&self) -> io::Result<Vec<String>> {
        let mut keys: Vec<String> = self.entries.lock().keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

/// One `<key>.json` file per entry inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }
}

/// Bytes outside `[A-Za-z0-9_-]` become `%XX`, so distinct keys never share
/// a file and the key can be recovered from the file name.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || b == b'_' || b == b'-' {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

fn decode_key(file_stem: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(file_stem.len());
    let mut rest = file_stem.as_bytes();
    while let Some((&b, tail)) = rest.split_first() {
        if b == b'%' {
            let hex = std::str::from_utf8(tail.get(..2)?).ok()?;
            bytes.push(u8::from_str_radix(hex, 16).ok()?);
            rest = &tail[2..];
        } else {
            bytes.push(b);
            rest = tail;
        }
    }
    String::from_utf8(bytes).ok()
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.entry_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn put(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.entry_path(key), value)
    }

    fn keys(&self) -> io::Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(key) = path.file_stem().and_then(|s| s.to_str()).and_then(decode_key) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Location records keyed by city id, stored as JSON under `city_<id>`.
#[derive(Clone)]
pub struct LocationCache {
    store: Arc<dyn KeyValueStore>,
}

impl LocationCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn key_for(city_id: &str) -> String {
        format!("{KEY_PREFIX}{city_id}")
    }

    /// Cached record for `city_id`. Unreadable or corrupt entries count as absent.
    pub fn get(&self, city_id: &str) -> Option<LocationRecord> {
        let key = Self::key_for(city_id);

        let raw = match self.store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(%key, error = %e, "Failed to read location cache entry");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(source) => {
                let err = ForecastError::MalformedCache { key, source };
                warn!(error = %err, cause = %err_source(&err), "Ignoring cache entry");
                None
            }
        }
    }

    pub fn put(&self, city_id: &str, record: &LocationRecord) -> io::Result<()> {
        let key = Self::key_for(city_id);
        let json = serde_json::to_string(record).map_err(io::Error::other)?;
        self.store.put(&key, &json)?;
        debug!(%key, "Stored location record");
        Ok(())
    }

    /// City ids with a cache entry, valid or not.
    pub fn city_ids(&self) -> io::Result<Vec<String>> {
        Ok(self
            .store
            .keys()?
            .into_iter()
            .filter_map(|k| k.strip_prefix(KEY_PREFIX).map(str::to_string))
            .collect())
    }
}

fn err_source(err: &ForecastError) -> String {
    std::error::Error::source(err)
        .map(|s| s.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paris() -> LocationRecord {
        LocationRecord {
            id: 3453,
            name: "Paris".into(),
            country: "France".into(),
            country_code: "FR".into(),
            region: "Île-de-France".into(),
            latitude: 48.8566,
            longitude: 2.3522,
        }
    }

    #[test]
    fn memory_roundtrip_and_last_write_wins() {
        let cache = LocationCache::new(Arc::new(MemoryStore::new()));
        assert!(cache.get("3453").is_none());

        cache.put("3453", &paris()).unwrap();
        assert_eq!(cache.get("3453"), Some(paris()));

        let mut renamed = paris();
        renamed.name = "Paris 2".into();
        cache.put("3453", &renamed).unwrap();
        assert_eq!(cache.get("3453").unwrap().name, "Paris 2");
    }

    #[test]
    fn entries_use_namespaced_keys() {
        let store = Arc::new(MemoryStore::new());
        let cache = LocationCache::new(store.clone());
        cache.put("3453", &paris()).unwrap();

        assert_eq!(store.keys().unwrap(), vec!["city_3453".to_string()]);
        let raw = store.get("city_3453").unwrap().unwrap();
        assert!(raw.contains("\"countryCode\":\"FR\""));
        assert_eq!(cache.city_ids().unwrap(), vec!["3453".to_string()]);
    }

    #[test]
    fn corrupt_entry_is_treated_as_absent() {
        let store = Arc::new(MemoryStore::new());
        store.put("city_3453", "{not json").unwrap();

        let cache = LocationCache::new(store);
        assert!(cache.get("3453").is_none());
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();

        let first = LocationCache::new(Arc::new(FileStore::new(dir.path())));
        first.put("3453", &paris()).unwrap();

        let second = LocationCache::new(Arc::new(FileStore::new(dir.path())));
        assert_eq!(second.get("3453"), Some(paris()));
        assert_eq!(second.city_ids().unwrap(), vec!["3453".to_string()]);
    }

    #[test]
    fn file_store_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nope"));

        assert_eq!(store.get("city_1").unwrap(), None);
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn file_store_escapes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.put("city_../etc", "x").unwrap();

        assert!(dir.path().join("city_%2E%2E%2Fetc.json").exists());
        assert_eq!(store.get("city_../etc").unwrap().as_deref(), Some("x"));
        assert_eq!(store.keys().unwrap(), vec!["city_../etc".to_string()]);
    }

    #[test]
    fn file_store_keeps_similar_ids_apart() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocationCache::new(Arc::new(FileStore::new(dir.path())));

        let mut dotted = paris();
        dotted.name = "Dotted".into();
        cache.put("a.b", &dotted).unwrap();

        assert!(cache.get("a_b").is_none());
        assert!(cache.get("a%2Eb").is_none());
        assert_eq!(cache.get("a.b").map(|r| r.name).as_deref(), Some("Dotted"));

        cache.put("a_b", &paris()).unwrap();
        assert_eq!(cache.get("a.b").map(|r| r.name).as_deref(), Some("Dotted"));
        assert_eq!(
            cache.city_ids().unwrap(),
            vec!["a.b".to_string(), "a_b".to_string()]
        );
    }

    #[test]
    fn key_encoding_round_trips_non_ascii() {
        let key = "city_Zürich 1%";
        assert_eq!(decode_key(&encode_key(key)).as_deref(), Some(key));
        assert_eq!(decode_key("bad%4"), None);
    }
}
