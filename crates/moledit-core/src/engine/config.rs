use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_MAX_HISTORY: usize = 50;
pub const DEFAULT_BOND_THRESHOLD_FACTOR: f64 = 1.2;
pub const DEFAULT_PASTE_MIN_DISTANCE: f64 = 2.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Failed to read configuration file '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tunables for an editing session.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    /// Maximum number of undo steps retained per molecule.
    pub max_history: usize,
    /// Multiplier applied to the summed covalent radii when perceiving bonds.
    pub bond_threshold_factor: f64,
    /// Minimum clearance (Angstroms) between pasted atoms and existing atoms.
    pub paste_min_distance: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
            bond_threshold_factor: DEFAULT_BOND_THRESHOLD_FACTOR,
            paste_min_distance: DEFAULT_PASTE_MIN_DISTANCE,
        }
    }
}

impl EditorConfig {
    pub fn builder() -> EditorConfigBuilder {
        EditorConfigBuilder::new()
    }

    /// Parses a kebab-case TOML document. Keys that are absent keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let partial: PartialEditorConfig = toml::from_str(content)?;
        partial.into_builder().build()
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading editor configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

#[derive(Default)]
pub struct EditorConfigBuilder {
    max_history: Option<usize>,
    bond_threshold_factor: Option<f64>,
    paste_min_distance: Option<f64>,
}

impl EditorConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_history(mut self, depth: usize) -> Self {
        self.max_history = Some(depth);
        self
    }
    pub fn bond_threshold_factor(mut self, factor: f64) -> Self {
        self.bond_threshold_factor = Some(factor);
        self
    }
    pub fn paste_min_distance(mut self, distance: f64) -> Self {
        self.paste_min_distance = Some(distance);
        self
    }

    pub fn build(self) -> Result<EditorConfig, ConfigError> {
        let max_history = self.max_history.unwrap_or(DEFAULT_MAX_HISTORY);
        if max_history == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_history",
                reason: "must be at least 1".to_string(),
            });
        }

        let bond_threshold_factor = self
            .bond_threshold_factor
            .unwrap_or(DEFAULT_BOND_THRESHOLD_FACTOR);
        if !bond_threshold_factor.is_finite() || bond_threshold_factor <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "bond_threshold_factor",
                reason: format!("must be positive and finite, got {bond_threshold_factor}"),
            });
        }

        let paste_min_distance = self
            .paste_min_distance
            .unwrap_or(DEFAULT_PASTE_MIN_DISTANCE);
        if !paste_min_distance.is_finite() || paste_min_distance < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "paste_min_distance",
                reason: format!("must be non-negative and finite, got {paste_min_distance}"),
            });
        }

        Ok(EditorConfig {
            max_history,
            bond_threshold_factor,
            paste_min_distance,
        })
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialEditorConfig {
    max_history: Option<usize>,
    bond_threshold_factor: Option<f64>,
    paste_min_distance: Option<f64>,
}

impl PartialEditorConfig {
    fn into_builder(self) -> EditorConfigBuilder {
        EditorConfigBuilder {
            max_history: self.max_history,
            bond_threshold_factor: self.bond_threshold_factor,
            paste_min_distance: self.paste_min_distance,
        }
    }
}
