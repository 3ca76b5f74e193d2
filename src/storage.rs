use crate::errors::TrackerError;
use std::{
    collections::BTreeMap,
    future::Future,
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::error;

/// String-keyed persistent store. Reads and writes hit memory; `flush` makes
/// the current contents durable.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<&str>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
    fn keys(&self) -> Vec<String>;
    fn flush(&self) -> impl Future<Output = Result<(), TrackerError>> + Send;
}

/// Key-value pairs kept in a pretty-printed JSON object on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// A missing file starts empty; an unreadable one is logged and also
    /// starts empty so the tracker still comes up.
    pub async fn open(path: &Path) -> Self {
        let entries = match fs::read(path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(entries) => entries,
                Err(err) => {
                    error!("failed to parse data file: {err}");
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                error!("failed to read data file: {err}");
                BTreeMap::new()
            }
        };

        Self {
            path: path.to_path_buf(),
            entries,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn flush(&self) -> impl Future<Output = Result<(), TrackerError>> + Send {
        let path = self.path.clone();
        let payload = serde_json::to_vec_pretty(&self.entries);
        async move {
            fs::write(&path, payload?).await?;
            Ok::<(), TrackerError>(())
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn flush(&self) -> impl Future<Output = Result<(), TrackerError>> + Send {
        std::future::ready(Ok(()))
    }
}
