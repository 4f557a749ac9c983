#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

pub(crate) const DEFAULT_STORE_DIRNAME: &str = ".nestset";
pub(crate) const DEFAULT_TREE: &str = "default";

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(".git").exists() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Store next to the enclosing git checkout, or under `start` outside of one.
pub(crate) fn default_storage_dir_from_start(start: &Path) -> PathBuf {
    find_repo_root(start)
        .unwrap_or_else(|| start.to_path_buf())
        .join(DEFAULT_STORE_DIRNAME)
}
