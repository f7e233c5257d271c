use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use web_sys::window;

/// Key→value persistence boundary. The stores only ever read and write whole
/// snapshots, so the interface stays string-shaped; injecting it keeps the
/// store logic runnable against an in-memory fake in tests.
pub trait KeyValueStore {
    fn get_raw(&self, key: &str) -> Option<String>;
    fn set_raw(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str);
}

/// Reads a JSON record; absence and parse failures both read as `None`.
pub fn read_json<T, B>(backend: &B, key: &str) -> Option<T>
where
    T: DeserializeOwned,
    B: KeyValueStore,
{
    let raw = backend.get_raw(key)?;
    serde_json::from_str(&raw).ok()
}

pub fn write_json<T, B>(backend: &B, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    B: KeyValueStore,
{
    let json = serde_json::to_string(value)?;
    backend.set_raw(key, &json)
}

/// Browser `localStorage` backend.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct LocalStorage;

impl KeyValueStore for LocalStorage {
    fn get_raw(&self, key: &str) -> Option<String> {
        let storage = window()?.local_storage().ok()??;
        storage.get_item(key).ok()?
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        let storage = window()
            .and_then(|w| w.local_storage().ok().flatten())
            .ok_or_else(|| anyhow!("local storage unavailable"))?;
        storage
            .set_item(key, value)
            .map_err(|e| anyhow!("local storage write rejected: {:?}", e))
    }

    fn remove(&self, key: &str) {
        if let Some(w) = window() {
            if let Ok(Some(storage)) = w.local_storage() {
                let _ = storage.remove_item(key);
            }
        }
    }
}

#[cfg(test)]
pub mod fake {
    use super::KeyValueStore;
    use anyhow::Result;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    /// Shared in-memory backend. Clones see the same map, which lets a test
    /// reload a store "from the same storage" as a fresh process would.
    #[derive(Clone, Default)]
    pub struct MemoryStore {
        data: Rc<RefCell<HashMap<String, String>>>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn raw(&self, key: &str) -> Option<String> {
            self.data.borrow().get(key).cloned()
        }
    }

    impl KeyValueStore for MemoryStore {
        fn get_raw(&self, key: &str) -> Option<String> {
            self.data.borrow().get(key).cloned()
        }

        fn set_raw(&self, key: &str, value: &str) -> Result<()> {
            self.data
                .borrow_mut()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&self, key: &str) {
            self.data.borrow_mut().remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::MemoryStore;
    use super::{read_json, write_json, KeyValueStore};

    #[test]
    fn json_round_trip() {
        let store = MemoryStore::new();
        write_json(&store, "k", &vec![1, 2, 3]).unwrap();
        let back: Vec<i32> = read_json(&store, "k").unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }

    #[test]
    fn corrupt_json_reads_as_none() {
        let store = MemoryStore::new();
        store.set_raw("k", "{not json").unwrap();
        let back: Option<Vec<i32>> = read_json(&store, "k");
        assert!(back.is_none());
    }

    #[test]
    fn clones_share_the_same_map() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.set_raw("k", "v").unwrap();
        assert_eq!(other.get_raw("k").as_deref(), Some("v"));
        other.remove("k");
        assert!(store.get_raw("k").is_none());
    }
}
