// Configuration Storage Service
// Handles lookup-table file read/write and version backup

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::info;

use super::error::StoreError;
use super::tables::ConfigPayload;

const ENV_CONFIG_DIR: &str = "SITREP_CONFIG_DIR";
const TABLES_FILE: &str = "tables.json";
const BACKUPS_KEPT: usize = 10;

/// Persistence port for the admin-editable lookup tables.
pub trait TablesPort {
    /// `Ok(None)` means nothing has been persisted yet.
    fn load(&self) -> Result<Option<ConfigPayload>, StoreError>;
    fn save(&self, payload: &ConfigPayload) -> Result<(), StoreError>;
}

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join(TABLES_FILE);
        Self { config_dir, config_file }
    }

    /// Get default config directory, honouring `SITREP_CONFIG_DIR`
    pub fn default_config_dir() -> Option<PathBuf> {
        match std::env::var(ENV_CONFIG_DIR) {
            Ok(p) if !p.trim().is_empty() => Some(PathBuf::from(p)),
            _ => dirs::config_dir().map(|p| p.join("sitrep")),
        }
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Ensure config directory exists
    pub fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.config_dir)?;
        Ok(())
    }

    /// Create a backup of the current tables file
    fn create_backup(&self) -> Result<(), StoreError> {
        let backup_dir = self.config_dir.join("backups");
        fs::create_dir_all(&backup_dir)?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S%3f");
        let backup_file = backup_dir.join(format!("tables_{}.json", timestamp));

        fs::copy(&self.config_file, &backup_file)?;

        self.cleanup_old_backups(&backup_dir, BACKUPS_KEPT)
    }

    /// Remove old backups, keeping only the most recent N
    fn cleanup_old_backups(&self, backup_dir: &Path, keep: usize) -> Result<(), StoreError> {
        let mut entries: Vec<_> = fs::read_dir(backup_dir)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
            .collect();

        if entries.len() <= keep {
            return Ok(());
        }

        // Timestamped names sort chronologically
        entries.sort_by_key(|e| e.file_name());

        for entry in entries.iter().take(entries.len() - keep) {
            let _ = fs::remove_file(entry.path());
        }

        Ok(())
    }
}

impl TablesPort for ConfigStore {
    fn load(&self) -> Result<Option<ConfigPayload>, StoreError> {
        if !self.config_file.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.config_file)?;
        let payload = serde_json::from_str(&content)?;
        Ok(Some(payload))
    }

    fn save(&self, payload: &ConfigPayload) -> Result<(), StoreError> {
        self.ensure_dir()?;

        if self.config_file.exists() {
            self.create_backup()?;
        }

        let content = serde_json::to_string_pretty(payload)?;
        fs::write(&self.config_file, content)?;
        info!(path = %self.config_file.display(), "config.tables_saved");
        Ok(())
    }
}

/// Process-local store, for embedding and tests.
#[derive(Default)]
pub struct InMemoryTablesPort {
    slot: Mutex<Option<ConfigPayload>>,
}

impl InMemoryTablesPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(payload: ConfigPayload) -> Self {
        Self {
            slot: Mutex::new(Some(payload)),
        }
    }

    pub fn stored(&self) -> Option<ConfigPayload> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl TablesPort for InMemoryTablesPort {
    fn load(&self) -> Result<Option<ConfigPayload>, StoreError> {
        let slot = self
            .slot
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(slot.clone())
    }

    fn save(&self, payload: &ConfigPayload) -> Result<(), StoreError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        *slot = Some(payload.clone());
        Ok(())
    }
}
