//! Workspace access
//!
//! Ties the resolved configuration to the task document it points at.

use std::path::PathBuf;

use anyhow::Result;

use super::{Config, TodoStore};
use crate::domain::ToDoManager;

/// Configuration plus the store for the active task document
pub struct Workspace {
    config: Config,
    store: TodoStore,
}

impl Workspace {
    /// Opens a workspace
    ///
    /// `config_path` replaces the default config location; `data_file`
    /// overrides whatever document the config names.
    pub fn open(config_path: Option<PathBuf>, data_file: Option<PathBuf>) -> Result<Self> {
        let config = match config_path {
            Some(path) => Config::load_from(&path)?,
            None => Config::load()?,
        };
        let path = data_file.unwrap_or_else(|| config.data_file());
        tracing::debug!(path = %path.display(), "using task file");

        Ok(Self::with_config(config, path))
    }

    pub fn with_config(config: Config, data_file: impl Into<PathBuf>) -> Self {
        Self {
            config,
            store: TodoStore::new(data_file),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &TodoStore {
        &self.store
    }

    /// Reads the current task document
    pub fn load(&self) -> Result<ToDoManager> {
        self.store.load()
    }

    /// Replaces the task document
    pub fn save(&self, manager: &ToDoManager) -> Result<()> {
        self.store.save(manager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ToDo;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn data_file_flag_overrides_config() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "data_file = \"/nonexistent/configured.json\"\n").unwrap();

        let flag_path = dir.path().join("flag.json");
        let workspace = Workspace::open(Some(config_path.clone()), Some(flag_path.clone())).unwrap();
        assert_eq!(workspace.store().path(), flag_path);

        let workspace = Workspace::open(Some(config_path), None).unwrap();
        assert_eq!(
            workspace.store().path(),
            PathBuf::from("/nonexistent/configured.json")
        );
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::with_config(Config::default(), dir.path().join("todos.json"));

        let mut manager = workspace.load().unwrap();
        manager.add_todo(ToDo::new("Persist me").unwrap()).unwrap();
        workspace.save(&manager).unwrap();

        assert_eq!(workspace.load().unwrap(), manager);
    }
}
