//! State-file persistence for the registry.
//!
//! The snapshot is a JSON document covering the full data model: the
//! channel allow-list, the global events with their rule bags, and every
//! subscriber with its nested subscription table. Loading a missing file
//! bootstraps (and immediately persists) the current state, so a fresh
//! deployment starts from an empty file rather than an error.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use log::{debug, info};

use crate::error::{RegistryError, RegistryResult};
use crate::registry::Registry;

impl Registry {
    /// Open a registry bound to a state file and load whatever it holds.
    ///
    /// A missing file starts an empty registry and persists that empty
    /// state right away. Read and parse failures surface as
    /// [`RegistryError::Io`] / [`RegistryError::Format`].
    pub fn load(path: impl Into<PathBuf>) -> RegistryResult<Self> {
        let registry = Self::new();
        *registry.state_file.lock() = Some(path.into());
        registry.reload()?;
        Ok(registry)
    }

    /// Re-read the bound state file into this registry. No-op when no file
    /// is bound; a missing file persists the current state instead.
    ///
    /// On failure the in-memory data is left exactly as it was.
    pub fn reload(&self) -> RegistryResult<()> {
        let Some(path) = self.state_file.lock().clone() else {
            return Ok(());
        };

        let buf = match fs::read(&path) {
            Ok(buf) => buf,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("state file {} missing, writing current state", path.display());
                return self.save();
            }
            Err(err) => return Err(RegistryError::io("read state file", err)),
        };

        // parse into a scratch registry first so a bad file changes nothing
        let loaded: Registry = serde_json::from_slice(&buf)
            .map_err(|err| RegistryError::format("parse state file", err))?;
        self.adopt(loaded);
        debug!("loaded state from {}", path.display());
        Ok(())
    }

    /// Write the current state to the bound file. No-op when unbound.
    pub fn save(&self) -> RegistryResult<()> {
        let Some(path) = self.state_file.lock().clone() else {
            return Ok(());
        };

        let buf = serde_json::to_vec_pretty(self)
            .map_err(|err| RegistryError::format("encode state", err))?;
        fs::write(&path, buf).map_err(|err| RegistryError::io("write state file", err))?;
        debug!("saved state to {}", path.display());
        Ok(())
    }

    /// Point the registry at a new state file and load it.
    ///
    /// If the new file cannot be loaded the previous path is restored, so
    /// the registry is never left bound to a resource it failed to read.
    pub fn relocate(&self, path: impl Into<PathBuf>) -> RegistryResult<()> {
        let previous = self.state_file.lock().replace(path.into());
        if let Err(err) = self.reload() {
            *self.state_file.lock() = previous;
            return Err(err);
        }
        Ok(())
    }

    /// The path of the bound state file, if any.
    pub fn state_file(&self) -> Option<PathBuf> {
        self.state_file.lock().clone()
    }

    /// The full registry state as a compact JSON document.
    pub fn to_json(&self) -> RegistryResult<String> {
        serde_json::to_string(self).map_err(|err| RegistryError::format("encode state", err))
    }

    /// Parse a document produced by [`Registry::to_json`] into a registry
    /// with no bound state file.
    pub fn from_json(data: &str) -> RegistryResult<Self> {
        serde_json::from_str(data).map_err(|err| RegistryError::format("parse state", err))
    }
}
