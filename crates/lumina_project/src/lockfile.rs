//! `lumina.lock.json` loading and bare-specifier resolution (spec §6.3).
//!
//! Grounded on the teacher's `DependencySpec` untagged-enum trick
//! (`src/project/manifest.rs`): a package's `lumina` export map is either a
//! bare string (root export) or a map of subpaths, and `serde(untagged)`
//! lets one field type cover both without a custom `Deserialize` impl.
//! `find_project_root`-style upward directory search
//! (`src/project/build.rs`) grounds [`find_lockfile`].

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LuminaExports {
    Root(String),
    Subpaths(HashMap<String, String>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageEntry {
    pub version: String,
    pub resolved: String,
    #[serde(default)]
    pub integrity: Option<String>,
    #[serde(default)]
    pub lumina: Option<LuminaExports>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lockfile {
    #[serde(rename = "lockfileVersion")]
    pub lockfile_version: u32,
    pub packages: HashMap<String, PackageEntry>,
}

#[derive(Debug)]
pub enum LockfileError {
    Io(PathBuf, String),
    Parse(PathBuf, String),
}

impl std::fmt::Display for LockfileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockfileError::Io(path, e) => write!(f, "failed to read {}: {}", path.display(), e),
            LockfileError::Parse(path, e) => write!(f, "failed to parse {}: {}", path.display(), e),
        }
    }
}

impl std::error::Error for LockfileError {}

impl Default for Lockfile {
    fn default() -> Self {
        Lockfile { lockfile_version: 1, packages: HashMap::new() }
    }
}

impl Lockfile {
    pub fn load(path: &Path) -> Result<Self, LockfileError> {
        let content = fs::read_to_string(path).map_err(|e| LockfileError::Io(path.to_path_buf(), e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| LockfileError::Parse(path.to_path_buf(), e.to_string()))
    }

    /// Loads `path` if it exists, else starts a fresh empty lockfile — used
    /// by `lumina add`/`install` against a project with no lockfile yet.
    pub fn load_or_default(path: &Path) -> Result<Self, LockfileError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Lockfile::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), LockfileError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| LockfileError::Parse(path.to_path_buf(), e.to_string()))?;
        fs::write(path, json).map_err(|e| LockfileError::Io(path.to_path_buf(), e.to_string()))
    }

    /// Resolves `pkg/sub` (or bare `pkg`) against this lockfile's entries,
    /// joined with the package's `resolved` location.
    pub fn resolve(&self, specifier: &str, lockfile_dir: &Path) -> Option<PathBuf> {
        let (pkg, subpath) = match specifier.split_once('/') {
            Some((pkg, rest)) => (pkg, Some(rest)),
            None => (specifier, None),
        };
        let entry = self.packages.get(pkg)?;
        let export = match (&entry.lumina, subpath) {
            (Some(LuminaExports::Root(root)), None) => root.clone(),
            (Some(LuminaExports::Subpaths(map)), Some(sub)) => map.get(&format!("./{sub}")).cloned()?,
            (Some(LuminaExports::Subpaths(map)), None) => map.get(".").cloned()?,
            (None, None) => ".".to_string(),
            (None, Some(_)) => return None,
            (Some(LuminaExports::Root(_)), Some(_)) => return None,
        };
        let base = Path::new(&entry.resolved);
        let base = if base.is_absolute() { base.to_path_buf() } else { lockfile_dir.join(base) };
        Some(base.join(export))
    }
}

/// Walks upward from `start` looking for `lumina.lock.json`, mirroring the
/// teacher's `find_project_root` walk for `Largo.toml`.
pub fn find_lockfile(start: &Path) -> Option<PathBuf> {
    let mut current = if start.is_file() { start.parent()?.to_path_buf() } else { start.to_path_buf() };
    loop {
        let candidate = current.join("lumina.lock.json");
        if candidate.exists() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Lockfile {
        let json = r#"{
            "lockfileVersion": 1,
            "packages": {
                "leftpad": {
                    "version": "1.0.0",
                    "resolved": "./node_modules/leftpad",
                    "lumina": { "./string": "string.lm", ".": "index.lm" }
                },
                "simple": {
                    "version": "2.0.0",
                    "resolved": "./node_modules/simple",
                    "lumina": "index.lm"
                }
            }
        }"#;
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn resolves_subpath_export() {
        let lf = sample();
        let resolved = lf.resolve("leftpad/string", Path::new("/proj")).unwrap();
        assert_eq!(resolved, Path::new("/proj/node_modules/leftpad/string.lm"));
    }

    #[test]
    fn resolves_root_export_string_form() {
        let lf = sample();
        let resolved = lf.resolve("simple", Path::new("/proj")).unwrap();
        assert_eq!(resolved, Path::new("/proj/node_modules/simple/index.lm"));
    }

    #[test]
    fn unknown_package_resolves_to_none() {
        let lf = sample();
        assert!(lf.resolve("nope", Path::new("/proj")).is_none());
    }
}
