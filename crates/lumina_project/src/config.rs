//! `lumina.config.json` loading (spec §6.2).
//!
//! Grounded on the teacher's `Manifest::load`
//! (`src/project/manifest.rs`): read the file, deserialize with serde, wrap
//! I/O and parse failures in a typed error enum carrying the offending
//! path. The teacher's manifest is TOML; ours is JSON per the spec, so
//! `serde_json` replaces `toml` but the load/error shape is unchanged.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

fn default_target() -> Target {
    Target::Cjs
}

fn default_file_extensions() -> Vec<String> {
    vec![".lm".to_string(), ".lumina".to_string()]
}

fn default_cache_dir() -> String {
    ".lumina-cache".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Cjs,
    Esm,
    Wasm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(default)]
    pub grammar_path: Option<String>,
    #[serde(default)]
    pub out_dir: Option<String>,
    #[serde(default = "default_target")]
    pub target: Target,
    #[serde(default)]
    pub entries: Vec<String>,
    #[serde(default)]
    pub watch: Vec<String>,
    #[serde(default)]
    pub std_path: Option<String>,
    #[serde(default = "default_file_extensions")]
    pub file_extensions: Vec<String>,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
    #[serde(default)]
    pub recovery: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        ProjectConfig {
            grammar_path: None,
            out_dir: None,
            target: default_target(),
            entries: Vec::new(),
            watch: Vec::new(),
            std_path: None,
            file_extensions: default_file_extensions(),
            cache_dir: default_cache_dir(),
            recovery: false,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, String),
    Parse(PathBuf, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "failed to read {}: {}", path.display(), e),
            ConfigError::Parse(path, e) => write!(f, "failed to parse {}: {}", path.display(), e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl ProjectConfig {
    /// Loads `lumina.config.json` from `dir`. A missing file is not an
    /// error — callers get [`ProjectConfig::default`].
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join("lumina.config.json");
        if !path.exists() {
            return Ok(ProjectConfig::default());
        }
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::Io(path.clone(), e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse(path, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_applied_to_partial_config() {
        let json = r#"{ "target": "wasm" }"#;
        let cfg: ProjectConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.target, Target::Wasm);
        assert_eq!(cfg.cache_dir, ".lumina-cache");
        assert_eq!(cfg.file_extensions, vec![".lm".to_string(), ".lumina".to_string()]);
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let dir = std::env::temp_dir().join("lumina-project-config-test-missing");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let cfg = ProjectConfig::load(&dir).unwrap();
        assert_eq!(cfg.target, Target::Cjs);
        let _ = fs::remove_dir_all(&dir);
    }
}
