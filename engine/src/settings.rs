use std::collections::BTreeMap;
use std::path::Path;

use calcdoc::{CLOSE_FENCE, EMPTY_PLACEHOLDER, Fences, OPEN_FENCE};
use serde::Deserialize;

use crate::error::SettingsError;
use crate::registry::{Registry, Timing};

/// User settings, usually read from `calcdoc.toml`.
///
/// ```toml
/// empty_placeholder = "# nothing"
///
/// [fences]
/// open = "```rpn"
///
/// [timing]
/// mod = "immediate"
/// "+" = "on-submit"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub fences: FenceSettings,
    /// Line written into a region whose stack became empty.
    pub empty_placeholder: String,
    /// Timing overrides, by operator token.
    pub timing: BTreeMap<String, Timing>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FenceSettings {
    pub open: String,
    pub close: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            fences: FenceSettings::default(),
            empty_placeholder: EMPTY_PLACEHOLDER.to_string(),
            timing: BTreeMap::new(),
        }
    }
}

impl Default for FenceSettings {
    fn default() -> Self {
        FenceSettings {
            open: OPEN_FENCE.to_string(),
            close: CLOSE_FENCE.to_string(),
        }
    }
}

impl Settings {
    pub fn from_toml_str(source: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let source = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Settings::from_toml_str(&source)
    }

    pub fn fences(&self) -> Fences {
        Fences {
            open: self.fences.open.clone(),
            close: self.fences.close.clone(),
        }
    }

    /// The default registry with this file's timing overrides applied.
    pub fn registry(&self) -> Result<Registry, SettingsError> {
        let mut registry = Registry::new();
        for (token, timing) in &self.timing {
            if !registry.set_timing(token, *timing) {
                return Err(SettingsError::UnknownOperator(token.clone()));
            }
        }
        Ok(registry)
    }
}
