// Configuration Tables
// Admin-editable keyword and location lookup tables driving extraction

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::config_store::TablesPort;
use super::error::StoreError;
use crate::models::LocationCode;

/// Category name to keyword synonyms. Entry order decides first-match wins.
pub type KeywordMap = IndexMap<String, Vec<String>>;
/// Place name to code and coordinates.
pub type LocationTable = IndexMap<String, LocationCode>;

/// Import/export and persistence format. Absent keys leave tables untouched on import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_map: Option<KeywordMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_map: Option<KeywordMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_codes: Option<LocationTable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub militant_groups: Option<Vec<String>>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeywordTable {
    Actions,
    Targets,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationTables {
    action_map: KeywordMap,
    target_map: KeywordMap,
    location_codes: LocationTable,
    militant_groups: Vec<String>,
    location_corrections: IndexMap<String, String>,
}

fn keyword_map(entries: &[(&str, &[&str])]) -> KeywordMap {
    entries
        .iter()
        .map(|(category, keywords)| {
            (
                category.to_string(),
                keywords.iter().map(|k| k.to_string()).collect(),
            )
        })
        .collect()
}

fn default_action_map() -> KeywordMap {
    keyword_map(&[
        ("ambush", &["ambush", "ambushed"]),
        ("sb attk", &["suicide bomber", "sb attk", "sb"]),
        (
            "fire raid",
            &["sniper", "laser", "gl", "fire raid", "shot", "gunmen", "motorcyclist", "sniper fire"],
        ),
        ("blast", &["mine", "ied", "blast"]),
        ("strike", &["missile", "drone"]),
        (
            "raid",
            &["raid", "cp attack", "post attack", "attacked", "attk on", "hideout"],
        ),
        ("tgt attk", &["targeted", "target attk", "shot dead", "martyred"]),
        ("repulse", &["repulse"]),
        ("claimed attk", &["claimed"]),
    ])
}

fn default_target_map() -> KeywordMap {
    keyword_map(&[
        ("SFs cny", &["convoy", "cny", "military convoy"]),
        (
            "SFs Post/CP",
            &["post", "cp", "checkpost", "observation post", "bungalow", "bungla"],
        ),
        ("LEAs", &["police", "policeman", "police station", "ps"]),
        ("Army", &["army", "military"]),
        ("SFs", &["sfs", "security forces", "sf", "mil"]),
        ("CTD", &["ctd"]),
        ("FC", &["fc"]),
        ("PC", &["police constable", "constable"]),
        ("ASI", &["asi"]),
    ])
}

fn default_location_codes() -> LocationTable {
    [
        ("Bannu", LocationCode::new("Bxu", 32.98, 70.6)),
        ("North Waziristan", LocationCode::new("NWD", 32.96, 69.84)),
        ("South Waziristan", LocationCode::new("SWD", 32.42, 69.79)),
        ("Kurram", LocationCode::new("Krm", 33.8, 70.1)),
        ("Bajaur", LocationCode::new("Bjr", 34.7, 71.1)),
        ("Khyber", LocationCode::new("Khy", 34.0, 71.1)),
        ("Lakki Marwat", LocationCode::new("Lki", 32.6, 70.9)),
        ("Karachi", LocationCode::new("Kci", 24.86, 67.01)),
        ("Mardan", LocationCode::new("Mdx", 34.2, 72.0)),
        ("Dir Lower", LocationCode::new("DIL", 35.2, 71.9)),
        ("Dir Upper", LocationCode::new("DIU", 35.8, 72.0)),
        ("Dera Ismail Khan", LocationCode::new("DIK", 31.8, 70.9)),
        ("Panjgur", LocationCode::new("Pjr", 26.97, 64.10)),
        ("Balochistan", LocationCode::new("Bln", 28.4, 65.0)),
    ]
    .into_iter()
    .map(|(name, code)| (name.to_string(), code))
    .collect()
}

fn default_militant_groups() -> Vec<String> {
    ["FAK", "IMP", "BLA", "BLF", "FAH", "TTP"]
        .iter()
        .map(|g| g.to_string())
        .collect()
}

fn default_location_corrections() -> IndexMap<String, String> {
    [
        ("Jhao", "Jhalo"),
        ("Dosli", "Dosali"),
        ("Patnr", "Patne"),
        ("Spinwam", "Spenwam"),
    ]
    .iter()
    .map(|(wrong, right)| (wrong.to_string(), right.to_string()))
    .collect()
}

impl Default for ConfigurationTables {
    fn default() -> Self {
        Self::defaults()
    }
}

impl ConfigurationTables {
    /// Built-in tables.
    pub fn defaults() -> Self {
        Self {
            action_map: default_action_map(),
            target_map: default_target_map(),
            location_codes: default_location_codes(),
            militant_groups: default_militant_groups(),
            location_corrections: default_location_corrections(),
        }
    }

    /// Read persisted tables, falling back to defaults for anything absent or unreadable.
    pub fn load(port: &dyn TablesPort) -> Self {
        let mut tables = Self::defaults();
        match port.load() {
            Ok(Some(payload)) => {
                tables.import_configuration(payload);
                info!("config.tables_loaded");
            }
            Ok(None) => info!("config.tables_defaulted"),
            Err(e) => warn!(error = %e, "config.tables_unreadable, using defaults"),
        }
        tables
    }

    /// Persist the current tables verbatim.
    pub fn save(&self, port: &dyn TablesPort) -> Result<(), StoreError> {
        port.save(&self.export_configuration())
    }

    /// Restore the built-in tables and persist them.
    pub fn reset_to_defaults(&mut self, port: &dyn TablesPort) -> Result<(), StoreError> {
        let corrections = std::mem::take(&mut self.location_corrections);
        *self = Self::defaults();
        self.location_corrections = corrections;
        info!("config.tables_reset");
        self.save(port)
    }

    /// Overwrite only the tables present in `payload`. In-memory only.
    pub fn import_configuration(&mut self, payload: ConfigPayload) {
        if let Some(action_map) = payload.action_map {
            self.action_map = action_map;
        }
        if let Some(target_map) = payload.target_map {
            self.target_map = target_map;
        }
        if let Some(location_codes) = payload.location_codes {
            self.location_codes = location_codes;
        }
        if let Some(groups) = payload.militant_groups {
            self.militant_groups = groups;
        }
    }

    /// Parse and import a JSON payload. Nothing changes if the payload is malformed.
    pub fn import_json(&mut self, json: &str) -> Result<(), StoreError> {
        let payload: ConfigPayload = serde_json::from_str(json)?;
        self.import_configuration(payload);
        Ok(())
    }

    /// Snapshot of all four editable tables.
    pub fn export_configuration(&self) -> ConfigPayload {
        ConfigPayload {
            action_map: Some(self.action_map.clone()),
            target_map: Some(self.target_map.clone()),
            location_codes: Some(self.location_codes.clone()),
            militant_groups: Some(self.militant_groups.clone()),
        }
    }

    pub fn action_map(&self) -> &KeywordMap {
        &self.action_map
    }

    pub fn target_map(&self) -> &KeywordMap {
        &self.target_map
    }

    pub fn location_codes(&self) -> &LocationTable {
        &self.location_codes
    }

    pub fn militant_groups(&self) -> &[String] {
        &self.militant_groups
    }

    pub fn location_corrections(&self) -> &IndexMap<String, String> {
        &self.location_corrections
    }

    fn keyword_table_mut(&mut self, table: KeywordTable) -> &mut KeywordMap {
        match table {
            KeywordTable::Actions => &mut self.action_map,
            KeywordTable::Targets => &mut self.target_map,
        }
    }

    /// Add a keyword to a category, creating the category at the end if needed.
    pub fn add_keyword(&mut self, table: KeywordTable, category: &str, keyword: &str) -> bool {
        let keyword = keyword.trim().to_lowercase();
        let category = category.trim();
        if keyword.is_empty() || category.is_empty() {
            return false;
        }
        let keywords = self
            .keyword_table_mut(table)
            .entry(category.to_string())
            .or_default();
        if keywords.contains(&keyword) {
            return false;
        }
        keywords.push(keyword);
        true
    }

    /// Matches the keyword the way `add_keyword` stored it.
    pub fn remove_keyword(&mut self, table: KeywordTable, category: &str, keyword: &str) -> bool {
        let keyword = keyword.trim().to_lowercase();
        match self.keyword_table_mut(table).get_mut(category.trim()) {
            Some(keywords) => {
                let before = keywords.len();
                keywords.retain(|k| *k != keyword);
                keywords.len() != before
            }
            None => false,
        }
    }

    /// Add a group name (upper-cased). Duplicates are ignored.
    pub fn add_group(&mut self, group: &str) -> bool {
        let group = group.trim().to_uppercase();
        if group.is_empty() || self.militant_groups.contains(&group) {
            return false;
        }
        self.militant_groups.push(group);
        true
    }

    pub fn remove_group(&mut self, group: &str) -> bool {
        let group = group.trim().to_uppercase();
        let before = self.militant_groups.len();
        self.militant_groups.retain(|g| *g != group);
        self.militant_groups.len() != before
    }

    pub fn set_location(&mut self, name: &str, code: LocationCode) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        self.location_codes.insert(name.to_string(), code);
    }

    pub fn remove_location(&mut self, name: &str) -> bool {
        self.location_codes.shift_remove(name).is_some()
    }
}
