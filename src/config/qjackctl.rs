//! Read JACK presets and their settings from QjackCtl's configuration file

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::aliases;
use super::ini::IniDocument;
use crate::constants::qjackctl::{
    APP_DIR, DEFAULT_PRESET_KEY, FILENAME, KEY_SEPARATOR, PRESETS_SECTION, SETTINGS_SECTION,
};
use crate::schema::Component;
use crate::types::SettingValue;

/// Setting name → value for one component
pub type ComponentSettings = BTreeMap<String, SettingValue>;

/// All settings a preset defines, split by component
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct PresetSettings {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    engine: ComponentSettings,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    driver: ComponentSettings,
}

impl PresetSettings {
    pub fn component(&self, component: Component) -> &ComponentSettings {
        match component {
            Component::Engine => &self.engine,
            Component::Driver => &self.driver,
        }
    }

    fn component_mut(&mut self, component: Component) -> &mut ComponentSettings {
        match component {
            Component::Engine => &mut self.engine,
            Component::Driver => &mut self.driver,
        }
    }

    pub fn get(&self, component: Component, setting: &str) -> Option<&SettingValue> {
        self.component(component).get(setting)
    }

    pub fn insert(&mut self, component: Component, setting: &str, value: SettingValue) {
        self.component_mut(component).insert(setting.to_string(), value);
    }

    /// All entries, engine first
    pub fn iter(&self) -> impl Iterator<Item = (Component, &str, &SettingValue)> {
        Component::ALL.into_iter().flat_map(move |component| {
            self.component(component)
                .iter()
                .map(move |(name, value)| (component, name.as_str(), value))
        })
    }
}

/// Presets parsed from one version of the config file
///
/// Always rebuilt as a whole, never patched.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct PresetStore {
    /// Preset names in ordinal order
    pub presets: Vec<String>,
    pub settings: BTreeMap<String, PresetSettings>,
    pub default_preset: Option<String>,
}

/// Default location: `$XDG_CONFIG_HOME/rncbc.org/QjackCtl.conf`
pub fn default_config_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path.push(FILENAME);
    path
}

/// Sort key for preset ordinals: a trailing number compares numerically,
/// so `Preset10` sorts after `Preset9`
///
/// QjackCtl itself orders these keys as plain strings, which puts
/// `Preset10` before `Preset2`. With ten or more presets the list order and
/// the implied default therefore differ from a string sort.
fn ordinal_key(key: &str) -> (&str, Option<u64>, &str) {
    let prefix = key.trim_end_matches(|c: char| c.is_ascii_digit());
    let number = key[prefix.len()..].parse().ok();
    (prefix, number, key)
}

impl PresetStore {
    /// Read and parse a config file; a missing file is the empty store
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(Self::parse_str(&String::from_utf8_lossy(&bytes))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "QjackCtl configuration file not found");
                Ok(Self::default())
            }
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read QjackCtl config {}", path.display())),
        }
    }

    pub fn parse_str(text: &str) -> Self {
        let doc = IniDocument::parse(text);

        let mut presets = Vec::new();
        let mut default_preset = None;
        if let Some(section) = doc.section(PRESETS_SECTION) {
            let mut ordered: Vec<(&str, &str)> = section
                .entries()
                .filter(|(key, _)| *key != DEFAULT_PRESET_KEY)
                .collect();
            ordered.sort_by(|a, b| ordinal_key(a.0).cmp(&ordinal_key(b.0)));
            presets = ordered.into_iter().map(|(_, name)| name.to_string()).collect();

            // Taken verbatim: neither checked against the preset list nor
            // required to be non-empty
            default_preset = section.get(DEFAULT_PRESET_KEY).map(str::to_string);
        }
        let default_preset = default_preset.or_else(|| presets.first().cloned());

        let mut settings: BTreeMap<String, PresetSettings> = BTreeMap::new();
        if let Some(section) = doc.section(SETTINGS_SECTION) {
            for (key, raw) in section.entries() {
                let Some((preset, setting)) = key.split_once(KEY_SEPARATOR) else {
                    warn!(key = %key, "Settings key without preset name, ignoring it");
                    continue;
                };

                if !presets.iter().any(|p| p == preset) {
                    warn!(preset = %preset, "Unknown preset");
                    continue;
                }

                let setting = setting.to_lowercase();
                let (component, name) = aliases::resolve(&setting);
                settings
                    .entry(preset.to_string())
                    .or_default()
                    .insert(component, name, SettingValue::from_raw(raw));
            }
        }

        Self {
            presets,
            settings,
            default_preset,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn contains(&self, preset: &str) -> bool {
        self.presets.iter().any(|p| p == preset)
    }

    pub fn settings_for(&self, preset: &str) -> Option<&PresetSettings> {
        self.settings.get(preset)
    }
}
