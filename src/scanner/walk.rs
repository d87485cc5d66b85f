use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::error;
use walkdir::{DirEntry, WalkDir};

/// Sequential directory traversal yielding every non-directory entry under a
/// root (regular files, device nodes, FIFOs, symlinks to files), filtered by
/// glob ignore patterns. Directory symlinks are neither descended nor yielded.
pub struct FileWalker {
    root: PathBuf,
    ignore_patterns: Vec<Pattern>,
}

impl FileWalker {
    pub fn new(root: impl Into<PathBuf>, ignore_globs: &[String]) -> Self {
        let ignore_patterns = ignore_globs
            .iter()
            .filter_map(|glob| match Pattern::new(glob) {
                Ok(p) => Some(p),
                Err(e) => {
                    error!("Invalid glob pattern '{}': {}", glob, e);
                    None
                }
            })
            .collect();

        Self {
            root: root.into(),
            ignore_patterns,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_ignored(&self, entry: &DirEntry) -> bool {
        self.ignore_patterns
            .iter()
            .any(|pattern| pattern.matches_path(entry.path()))
    }

    /// Unreadable directories and entries are logged and skipped.
    pub fn files(&self) -> impl Iterator<Item = PathBuf> + '_ {
        WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(move |entry| entry.depth() == 0 || !self.is_ignored(entry))
            .filter_map(|entry_result| match entry_result {
                Ok(entry) => Some(entry),
                Err(err) => {
                    let path = err
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    error!("Error walking {}: {}", path, err);
                    None
                }
            })
            .filter(|entry| !is_directory(entry))
            .map(DirEntry::into_path)
    }
}

fn is_directory(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() || (entry.path_is_symlink() && entry.path().is_dir())
}

/// Store key for `path`: relative to the walk root when possible.
pub fn relative_key(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.to_string_lossy().into_owned(),
        _ => path.to_string_lossy().into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn keys(walker: &FileWalker) -> Vec<String> {
        let mut keys: Vec<String> = walker
            .files()
            .map(|p| relative_key(walker.root(), &p).replace('\\', "/"))
            .collect();
        keys.sort();
        keys
    }

    #[test]
    fn test_walk_yields_nested_files() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/deep")).unwrap();
        fs::write(dir.path().join("top.txt"), "1").unwrap();
        fs::write(dir.path().join("a/b.txt"), "22").unwrap();
        fs::write(dir.path().join("a/deep/c.txt"), "").unwrap();

        let walker = FileWalker::new(dir.path(), &[]);
        assert_eq!(keys(&walker), vec!["a/b.txt", "a/deep/c.txt", "top.txt"]);
    }

    #[test]
    fn test_ignore_patterns_prune() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("keep")).unwrap();
        fs::create_dir_all(dir.path().join("skip")).unwrap();
        fs::write(dir.path().join("keep/x.txt"), "x").unwrap();
        fs::write(dir.path().join("keep/y.tmp"), "y").unwrap();
        fs::write(dir.path().join("skip/z.txt"), "z").unwrap();

        let walker = FileWalker::new(
            dir.path(),
            &["**/skip".to_string(), "*.tmp".to_string(), "[".to_string()],
        );
        assert_eq!(keys(&walker), vec!["keep/x.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_yields_special_files_and_file_links() {
        use std::os::unix::fs::symlink;
        use std::process::Command;

        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("regular.txt"), "r").unwrap();
        symlink(dir.path().join("regular.txt"), dir.path().join("link.txt")).unwrap();
        symlink(dir.path().join("sub"), dir.path().join("sub_link")).unwrap();
        let status = Command::new("mkfifo")
            .arg(dir.path().join("device.fifo"))
            .status()
            .unwrap();
        assert!(status.success());

        let walker = FileWalker::new(dir.path(), &[]);
        assert_eq!(
            keys(&walker),
            vec!["device.fifo", "link.txt", "regular.txt"]
        );
    }

    #[test]
    fn test_relative_key_falls_back_to_full_path() {
        let root = Path::new("/data/root");
        assert_eq!(relative_key(root, Path::new("/elsewhere/f")), "/elsewhere/f");
        assert_eq!(relative_key(root, root), "/data/root");
    }
}
