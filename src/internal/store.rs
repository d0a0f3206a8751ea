use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::info;

/// String-keyed, string-valued persistent storage.
///
/// Shared by the headline cache and the theme preference. Implementations
/// persist eagerly: a successful `set` is durable before it returns.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// In-process store, used by tests and as a fallback when the storage
/// directory cannot be created.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A JSON object on disk, rewritten in full on every mutation.
#[derive(Debug, Clone)]
pub struct FileStore {
    file_path: PathBuf,
    entries: Arc<RwLock<BTreeMap<String, String>>>,
}

impl FileStore {
    /// Open the store in the configured directory, or in the OS config
    /// directory under `tui-headlines` when none is given.
    pub fn load_or_create(dir: Option<&Path>) -> Result<Self> {
        let dir = match dir {
            Some(dir) => dir.to_path_buf(),
            None => dirs::config_dir()
                .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
                .join("tui-headlines"),
        };

        if !dir.exists() {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create storage directory {}", dir.display()))?;
            info!(storage_dir = %dir.display(), "Created storage directory");
        }

        Self::open(dir.join("storage.json"))
    }

    /// Open a specific file. A missing file starts empty; an unreadable or
    /// corrupt one also starts empty and is replaced on the next write.
    pub fn open(file_path: PathBuf) -> Result<Self> {
        let entries = match file_path.exists() {
            true => {
                let content =
                    fs::read_to_string(&file_path).context("Failed to read storage file")?;
                match serde_json::from_str::<BTreeMap<String, String>>(&content) {
                    Ok(entries) => {
                        info!(storage_file = %file_path.display(), keys = entries.len(), "Loaded storage file");
                        entries
                    }
                    Err(e) => {
                        tracing::warn!(storage_file = %file_path.display(), "Discarding corrupt storage file: {}", e);
                        BTreeMap::new()
                    }
                }
            }
            false => {
                info!(storage_file = %file_path.display(), "No storage file found, starting empty");
                BTreeMap::new()
            }
        };

        Ok(Self {
            file_path,
            entries: Arc::new(RwLock::new(entries)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let content = serde_json::to_string_pretty(entries).context("Failed to serialize storage")?;
        fs::write(&self.file_path, content).with_context(|| {
            format!("Failed to write storage file {}", self.file_path.display())
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow::anyhow!("storage lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }
}
