// Directory listing: the only place the walk touches the filesystem.
// Reads are best-effort. A directory that cannot be listed is logged and
// treated as empty so one bad subtree never stops the whole walk.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;

/// One immediate child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: OsString,
    pub is_directory: bool,
}

/// Lists the immediate children of a directory. The traversal engine is
/// generic over this so tests can count or fake reads.
pub trait EntryReader {
    /// Children of `dir`, sorted by name. Directories are always returned,
    /// regular files only when `include_files` is set.
    fn read_entries(&self, dir: &Path, include_files: bool) -> Vec<DirEntryInfo>;
}

/// Reads straight from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl EntryReader for FsReader {
    fn read_entries(&self, dir: &Path, include_files: bool) -> Vec<DirEntryInfo> {
        match list_children(dir, include_files) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("could not read {}: {}", dir.display(), e);
                Vec::new()
            }
        }
    }
}

fn list_children(dir: &Path, include_files: bool) -> io::Result<Vec<DirEntryInfo>> {
    if fs::symlink_metadata(dir)?.is_file() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        // file_type() does not follow symlinks, so links are neither and get skipped
        let file_type = entry.file_type()?;
        let is_directory = file_type.is_dir();
        if is_directory || (include_files && file_type.is_file()) {
            entries.push(DirEntryInfo {
                name: entry.file_name(),
                is_directory,
            });
        }
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn names(entries: &[DirEntryInfo]) -> Vec<String> {
        entries
            .iter()
            .map(|e| e.name.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn lists_directories_only_by_default() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let entries = FsReader.read_entries(dir.path(), false);
        assert_eq!(names(&entries), vec!["a", "b"]);
        assert!(entries.iter().all(|e| e.is_directory));
    }

    #[test]
    fn includes_files_when_asked() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("README.md"), "x").unwrap();

        let entries = FsReader.read_entries(dir.path(), true);
        assert_eq!(names(&entries), vec!["README.md", "src"]);
        assert!(!entries[0].is_directory);
        assert!(entries[1].is_directory);
    }

    #[test]
    fn regular_file_has_no_children() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, "x").unwrap();

        assert!(FsReader.read_entries(&file, true).is_empty());
    }

    #[test]
    fn missing_directory_reads_as_empty() {
        let dir = tempdir().unwrap();
        let gone = dir.path().join("gone");

        assert!(FsReader.read_entries(&gone, true).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_skipped() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("real")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).unwrap();

        let entries = FsReader.read_entries(dir.path(), true);
        assert_eq!(names(&entries), vec!["real"]);
    }
}
