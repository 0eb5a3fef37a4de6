//! JSON document storage for tasks
//!
//! The whole collection lives in one file as a JSON array of task objects.
//! Uses file locking for concurrent access safety.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use crate::domain::{ToDoManager, TodoError};

/// Store for the task document
pub struct TodoStore {
    path: PathBuf,
}

impl TodoStore {
    /// Creates a new store at the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the document is written to before the rename
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("todos.json"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Sibling file writers hold exclusively for the whole save
    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("todos.json"));
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Reads the whole collection
    ///
    /// A missing or blank file is an empty collection. Anything else that is
    /// not a valid document fails with a [`TodoError`] (`CorruptData` or
    /// `Cycle`) wrapped in the file context.
    pub fn load(&self) -> Result<ToDoManager> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "task file missing, starting empty");
            return Ok(ToDoManager::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open task file: {}", self.path.display()))?;

        // Acquire shared lock for reading
        file.lock_shared()
            .context("Failed to acquire read lock on task file")?;

        let mut content = String::new();
        BufReader::new(&file)
            .read_to_string(&mut content)
            .with_context(|| format!("Failed to read task file: {}", self.path.display()))?;

        // Lock is released when file is dropped
        drop(file);

        if content.trim().is_empty() {
            return Ok(ToDoManager::new());
        }

        let manager = serde_json::from_str::<serde_json::Value>(&content)
            .map_err(|e| TodoError::corrupt(format!("not valid JSON: {}", e)))
            .and_then(ToDoManager::from_value)
            .with_context(|| format!("Failed to load tasks from {}", self.path.display()))?;

        tracing::debug!(path = %self.path.display(), count = manager.len(), "loaded tasks");
        Ok(manager)
    }

    /// Writes the whole collection (full rewrite)
    pub fn save(&self, manager: &ToDoManager) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        // Serialize writers before touching the temp file
        let lock_path = self.lock_path();
        let lock = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;
        lock.lock_exclusive()
            .context("Failed to acquire write lock on task file")?;

        // Write to temp file first
        let temp_path = self.temp_path();

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            let mut writer = BufWriter::new(&file);
            serde_json::to_writer_pretty(&mut writer, &manager.to_value())
                .context("Failed to serialize tasks")?;
            writeln!(writer).context("Failed to write task file")?;
            writer.flush().context("Failed to flush task file")?;
        }

        // Atomic rename
        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e).with_context(|| {
                format!(
                    "Failed to rename {} to {}",
                    temp_path.display(),
                    self.path.display()
                )
            });
        }

        // Lock is released when the lock file is dropped
        drop(lock);

        tracing::debug!(path = %self.path.display(), count = manager.len(), "saved tasks");
        Ok(())
    }
}

impl ToDoManager {
    /// Writes the collection to `path` as a JSON array
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        TodoStore::new(path.as_ref()).save(self)
    }

    /// Reads a collection written by [`ToDoManager::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        TodoStore::new(path.as_ref()).load()
    }
}
