//! Per-file lock registry
//!
//! Every store backed by the same file shares one reader/writer lock, so a
//! read-modify-write cycle cannot interleave with another write to that
//! file inside this process. Nothing here protects against other processes.

use dashmap::DashMap;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shared handle on the lock of one backing file
pub type FileLock = Arc<RwLock<()>>;

/// Lock-free map of backing file path to its lock
#[derive(Debug, Default, Clone)]
pub struct FileLocks {
    locks: Arc<DashMap<PathBuf, FileLock>>,
}

impl FileLocks {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock guarding `path`, created on first use
    ///
    /// Existing files are keyed by their canonical path, so `..` segments
    /// and symlinks resolve to the same lock. Missing files fall back to the
    /// absolute path.
    pub fn lock_for(&self, path: &Path) -> FileLock {
        let key = std::fs::canonicalize(path)
            .or_else(|_| std::path::absolute(path))
            .unwrap_or_else(|_| path.to_path_buf());
        self.locks.entry(key).or_default().clone()
    }

    /// Number of distinct files tracked
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// No file has been registered yet
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_path_shares_lock() {
        let locks = FileLocks::new();
        let a = locks.lock_for(Path::new("data/users.json"));
        let b = locks.lock_for(Path::new("data/users.json"));
        let c = locks.lock_for(Path::new("data/posts.json"));

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(locks.len(), 2);
    }

    #[test]
    fn test_different_spellings_share_lock() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("data")).unwrap();
        let users = dir.path().join("users.json");
        std::fs::write(&users, "[]").unwrap();

        let locks = FileLocks::new();
        let direct = locks.lock_for(&users);
        let dotted = locks.lock_for(&dir.path().join("data/../users.json"));
        assert!(Arc::ptr_eq(&direct, &dotted));

        #[cfg(unix)]
        {
            let link = dir.path().join("link.json");
            std::os::unix::fs::symlink(&users, &link).unwrap();
            assert!(Arc::ptr_eq(&direct, &locks.lock_for(&link)));
        }
        assert_eq!(locks.len(), 1);
    }

    #[test]
    fn test_clones_share_registry() {
        let locks = FileLocks::new();
        let clone = locks.clone();
        let a = locks.lock_for(Path::new("users.json"));
        let b = clone.lock_for(Path::new("users.json"));
        assert!(Arc::ptr_eq(&a, &b));
    }
}
