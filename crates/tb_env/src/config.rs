use crate::error::EnvError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use tb_engine::EngineLimits;

/// Which game is being played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// The first verified root wins the episode.
    SingleRoot,
    /// Roots are collected one at a time until the agent declares completion.
    #[default]
    MultiRoot,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::SingleRoot => f.write_str("single-root"),
            Variant::MultiRoot => f.write_str("multi-root"),
        }
    }
}

/// Which free variables a workspace expression may mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionPolicy {
    /// Only variables currently on the equation board.
    Strict,
    /// Any variable at all.
    #[default]
    Permissive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    pub variant: Variant,
    pub extraction: ExtractionPolicy,
    /// Workspace entries are cut to this many characters before extraction.
    pub max_entry_chars: usize,
    /// Tolerance of the numeric root comparison, relative to the larger
    /// magnitude (at least 1).
    pub numeric_tolerance: f64,
    pub reset_clears_substitutions: bool,
    /// Bound on the substitution-chain fixed point.
    pub max_resolution_passes: usize,
    pub engine: EngineLimits,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::multi_root()
    }
}

impl EnvConfig {
    pub fn multi_root() -> Self {
        Self {
            variant: Variant::MultiRoot,
            extraction: ExtractionPolicy::Permissive,
            max_entry_chars: 256,
            numeric_tolerance: 1e-10,
            reset_clears_substitutions: true,
            max_resolution_passes: 64,
            engine: EngineLimits::default(),
        }
    }

    /// The original game: strict extraction, one root ends the episode.
    pub fn single_root() -> Self {
        Self {
            variant: Variant::SingleRoot,
            extraction: ExtractionPolicy::Strict,
            ..Self::multi_root()
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, EnvError> {
        let config: EnvConfig =
            toml::from_str(text).map_err(|e| EnvError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, EnvError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| EnvError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, EnvError> {
        toml::to_string_pretty(self).map_err(|e| EnvError::Config(e.to_string()))
    }

    fn validate(&self) -> Result<(), EnvError> {
        if self.max_entry_chars == 0 {
            return Err(EnvError::Config("max_entry_chars must be positive".into()));
        }
        if !(self.numeric_tolerance.is_finite() && self.numeric_tolerance > 0.0) {
            return Err(EnvError::Config(format!(
                "numeric_tolerance must be a positive number, got {}",
                self.numeric_tolerance
            )));
        }
        if self.max_resolution_passes == 0 {
            return Err(EnvError::Config(
                "max_resolution_passes must be positive".into(),
            ));
        }
        Ok(())
    }
}
