//! Filesystem watching for `lumina watch`.
//!
//! The core pipeline deliberately has no filesystem-watcher dependency
//! (§1's "filesystem watchers" external-collaborator exclusion); this
//! trait is the one concrete implementation the CLI provides, backed by
//! polling rather than `notify`, matching the teacher's general preference
//! for a hand-rolled, dependency-light implementation over pulling in a
//! platform-specific crate for something this binary can poll cheaply.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub trait FsWatcher {
    /// Blocks until at least one watched path has changed since the last
    /// call (or since construction, on the first call), then returns the
    /// changed paths.
    fn poll_changes(&mut self) -> Vec<PathBuf>;
}

pub struct PollingWatcher {
    paths: Vec<PathBuf>,
    mtimes: HashMap<PathBuf, SystemTime>,
    interval: std::time::Duration,
}

impl PollingWatcher {
    pub fn new(paths: Vec<PathBuf>, interval: std::time::Duration) -> Self {
        let mut mtimes = HashMap::new();
        for p in &paths {
            if let Ok(meta) = std::fs::metadata(p) {
                if let Ok(modified) = meta.modified() {
                    mtimes.insert(p.clone(), modified);
                }
            }
        }
        PollingWatcher { paths, mtimes, interval }
    }

    fn scan_once(&mut self) -> Vec<PathBuf> {
        let mut changed = Vec::new();
        for p in &self.paths {
            let current = std::fs::metadata(p).ok().and_then(|m| m.modified().ok());
            let previous = self.mtimes.get(p).copied();
            if current != previous {
                changed.push(p.clone());
                if let Some(c) = current {
                    self.mtimes.insert(p.clone(), c);
                } else {
                    self.mtimes.remove(p);
                }
            }
        }
        changed
    }
}

impl FsWatcher for PollingWatcher {
    fn poll_changes(&mut self) -> Vec<PathBuf> {
        loop {
            let changed = self.scan_once();
            if !changed.is_empty() {
                return changed;
            }
            std::thread::sleep(self.interval);
        }
    }
}

/// Expands a list of configured watch globs/paths into concrete file paths,
/// filtered to the configured source extensions. Non-recursive glob syntax
/// is not supported; directories are walked one level at a time.
pub fn expand_watch_paths(roots: &[String], extensions: &[String]) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for root in roots {
        collect(Path::new(root), extensions, &mut out);
    }
    out
}

fn collect(path: &Path, extensions: &[String], out: &mut Vec<PathBuf>) {
    if path.is_file() {
        if has_source_extension(path, extensions) {
            out.push(path.to_path_buf());
        }
        return;
    }
    let Ok(entries) = std::fs::read_dir(path) else { return };
    for entry in entries.flatten() {
        let p = entry.path();
        if p.is_dir() {
            collect(&p, extensions, out);
        } else if has_source_extension(&p, extensions) {
            out.push(p);
        }
    }
}

fn has_source_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(name) = path.to_str() else { return false };
    extensions.iter().any(|ext| name.ends_with(ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn polling_watcher_detects_a_content_change() {
        let dir = std::env::temp_dir().join("lumina-cli-watch-test");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("a.lm");
        fs::write(&file, "fn f() -> i32 { 1 }").unwrap();

        let mut watcher = PollingWatcher::new(vec![file.clone()], std::time::Duration::from_millis(5));
        std::thread::sleep(std::time::Duration::from_millis(10));
        fs::write(&file, "fn f() -> i32 { 2 }").unwrap();
        let changed = watcher.poll_changes();
        assert_eq!(changed, vec![file]);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn expand_watch_paths_filters_by_extension() {
        let dir = std::env::temp_dir().join("lumina-cli-watch-expand-test");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("a.lm"), "fn f() -> i32 { 1 }").unwrap();
        fs::write(dir.join("readme.md"), "hello").unwrap();

        let found = expand_watch_paths(&[dir.to_string_lossy().into_owned()], &[".lm".to_string()]);
        assert_eq!(found.len(), 1);
        let _ = fs::remove_dir_all(&dir);
    }
}
