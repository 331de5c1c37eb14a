//! On-disk build cache layout (spec §6.4).
//!
//! `<cacheDir>/deps.json` tracks a hash and import list per absolute
//! source path; `<cacheDir>/<hash(sourcePath)>.json` holds one entry's
//! parsed artifacts. Every read tolerates corruption by treating a parse
//! failure as a cache miss rather than propagating the error, matching the
//! teacher's general preference (`project/loader.rs`'s `Loader` cache) for
//! a best-effort cache that degrades to a reload instead of poisoning the
//! session.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileDeps {
    pub hash: String,
    pub imports: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepsCache {
    pub files: HashMap<String, FileDeps>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceCacheEntry {
    pub hash: String,
    pub diagnostics_json: String,
    pub ir_json: Option<String>,
    pub grammar_hash: Option<String>,
}

pub struct Cache {
    dir: PathBuf,
}

impl Cache {
    pub fn new(dir: PathBuf) -> Self {
        Cache { dir }
    }

    fn deps_path(&self) -> PathBuf {
        self.dir.join("deps.json")
    }

    fn entry_path(&self, source_path: &str) -> PathBuf {
        let mut hasher = DefaultHasher::new();
        source_path.hash(&mut hasher);
        self.dir.join(format!("{:016x}.json", hasher.finish()))
    }

    pub fn load_deps(&self) -> DepsCache {
        fs::read_to_string(self.deps_path())
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    pub fn save_deps(&self, deps: &DepsCache) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(deps).unwrap_or_default();
        fs::write(self.deps_path(), json)
    }

    pub fn load_entry(&self, source_path: &str) -> Option<SourceCacheEntry> {
        let text = fs::read_to_string(self.entry_path(source_path)).ok()?;
        serde_json::from_str(&text).ok()
    }

    pub fn save_entry(&self, source_path: &str, entry: &SourceCacheEntry) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(entry).unwrap_or_default();
        fs::write(self.entry_path(source_path), json)
    }

    pub fn invalidate(&self, source_path: &str) {
        let _ = fs::remove_file(self.entry_path(source_path));
    }
}

pub fn hash_text(text: &str) -> String {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_source_cache_entry() {
        let dir = std::env::temp_dir().join("lumina-project-cache-test");
        let _ = fs::remove_dir_all(&dir);
        let cache = Cache::new(dir.clone());
        let entry = SourceCacheEntry {
            hash: hash_text("fn f() -> i32 { 1 }"),
            diagnostics_json: "[]".to_string(),
            ir_json: None,
            grammar_hash: None,
        };
        cache.save_entry("/proj/main.lum", &entry).unwrap();
        let loaded = cache.load_entry("/proj/main.lum").unwrap();
        assert_eq!(loaded.hash, entry.hash);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_entry_is_treated_as_a_miss() {
        let dir = std::env::temp_dir().join("lumina-project-cache-test-corrupt");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let cache = Cache::new(dir.clone());
        fs::write(cache.entry_path("/proj/bad.lum"), "not json").unwrap();
        assert!(cache.load_entry("/proj/bad.lum").is_none());
        let _ = fs::remove_dir_all(&dir);
    }
}
