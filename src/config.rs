// Tue Jan 13 2026 - Alex

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub abi: AbiConfig,
    pub max_threads: usize,
    pub parallel: bool,
    /// Explicit offset annotations become the recorded offset and
    /// resynchronize inference. When off they are only checked.
    pub explicit_offsets_authoritative: bool,
    pub compute_layouts: bool,
}

/// Sizes the layout engine cannot know from the headers alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AbiConfig {
    pub pointer_size: u64,
    /// Cap on natural alignment (`#pragma pack` style); 0 disables it.
    pub max_alignment: u64,
    pub containers: IndexMap<String, ContainerLayout>,
}

/// Layout of an opaque container, matched by its unqualified name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerLayout {
    pub size: u64,
    pub alignment: u64,
    /// Expected number of template arguments, if checked.
    #[serde(default)]
    pub arity: Option<usize>,
}

impl ContainerLayout {
    pub fn new(size: u64, alignment: u64) -> Self {
        Self {
            size,
            alignment,
            arity: None,
        }
    }

    pub fn with_arity(mut self, arity: usize) -> Self {
        self.arity = Some(arity);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            abi: AbiConfig::default(),
            max_threads: num_cpus::get(),
            parallel: true,
            explicit_offsets_authoritative: true,
            compute_layouts: true,
        }
    }
}

impl Default for AbiConfig {
    fn default() -> Self {
        let mut containers = IndexMap::new();
        containers.insert("DynArray".to_string(), ContainerLayout::new(0x10, 8).with_arity(1));
        containers.insert("Handle".to_string(), ContainerLayout::new(0x10, 8).with_arity(1));
        containers.insert("WeakHandle".to_string(), ContainerLayout::new(0x10, 8).with_arity(1));
        containers.insert("HashMap".to_string(), ContainerLayout::new(0x30, 8).with_arity(2));
        containers.insert("CString".to_string(), ContainerLayout::new(0x20, 8).with_arity(0));
        containers.insert("CName".to_string(), ContainerLayout::new(0x8, 8).with_arity(0));
        Self {
            pointer_size: 8,
            max_alignment: 0,
            containers,
        }
    }
}

impl AbiConfig {
    pub fn container(&self, name: &str) -> Option<&ContainerLayout> {
        self.containers.get(name)
    }

    /// Natural alignment after the packing cap.
    pub fn clamp_alignment(&self, alignment: u64) -> u64 {
        if self.max_alignment == 0 {
            alignment.max(1)
        } else {
            alignment.clamp(1, self.max_alignment)
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config: Config = serde_json::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_max_threads(mut self, threads: usize) -> Self {
        self.max_threads = threads;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_pointer_size(mut self, size: u64) -> Self {
        self.abi.pointer_size = size;
        self
    }

    pub fn with_container(mut self, name: &str, layout: ContainerLayout) -> Self {
        self.abi.containers.insert(name.to_string(), layout);
        self
    }

    pub fn with_explicit_offsets_authoritative(mut self, authoritative: bool) -> Self {
        self.explicit_offsets_authoritative = authoritative;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_threads == 0 {
            return Err(ConfigError::Validation("max_threads must be greater than 0".to_string()));
        }
        if !matches!(self.abi.pointer_size, 4 | 8) {
            return Err(ConfigError::Validation(format!(
                "pointer_size must be 4 or 8, got {}",
                self.abi.pointer_size
            )));
        }
        if self.abi.max_alignment != 0 && !self.abi.max_alignment.is_power_of_two() {
            return Err(ConfigError::Validation("max_alignment must be a power of two".to_string()));
        }
        for (name, layout) in &self.abi.containers {
            if !layout.alignment.is_power_of_two() {
                return Err(ConfigError::Validation(format!(
                    "container `{}` has alignment {}, expected a power of two",
                    name, layout.alignment
                )));
            }
            if layout.size % layout.alignment != 0 {
                return Err(ConfigError::Validation(format!(
                    "container `{}` size {:#x} is not a multiple of its alignment",
                    name, layout.size
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("config file not found: {0:?}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.explicit_offsets_authoritative);
        assert_eq!(config.abi.pointer_size, 8);
        assert_eq!(config.abi.container("DynArray").map(|c| c.size), Some(0x10));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: Config = serde_json::from_str(
            r#"{ "abi": { "pointer_size": 4, "containers": { "Vec": { "size": 12, "alignment": 4 } } }, "parallel": false }"#,
        )
        .unwrap();
        assert_eq!(config.abi.pointer_size, 4);
        assert!(!config.parallel);
        assert!(config.abi.container("DynArray").is_none());
        assert_eq!(config.abi.container("Vec").unwrap().arity, None);
        assert!(config.explicit_offsets_authoritative);
    }

    #[test]
    fn test_validation_errors() {
        assert!(Config::new().with_max_threads(0).validate().is_err());
        assert!(Config::new().with_pointer_size(6).validate().is_err());
        let bad = Config::new().with_container("Odd", ContainerLayout::new(10, 8));
        assert!(matches!(bad.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_clamp_alignment() {
        let mut abi = AbiConfig::default();
        assert_eq!(abi.clamp_alignment(8), 8);
        abi.max_alignment = 4;
        assert_eq!(abi.clamp_alignment(8), 4);
        assert_eq!(abi.clamp_alignment(0), 1);
    }
}
