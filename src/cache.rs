// Single-slot memo for the walk. The project-name prompt can be asked
// several times in one session against the same working directory, so the
// last result is kept and served again until a different root comes in.

use std::path::{Path, PathBuf};

use crate::entries::{EntryReader, FsReader};
use crate::walk::{walk_with, TraversalOptions};

struct CacheSlot {
    root: PathBuf,
    paths: Vec<String>,
}

/// Remembers the walk of the most recently requested root.
///
/// The slot is keyed on the root path alone: a hit returns the stored list
/// even when `options` differ from the ones it was computed with. Any other
/// root evicts it.
pub struct ResultCache<R = FsReader> {
    reader: R,
    slot: Option<CacheSlot>,
}

impl ResultCache<FsReader> {
    pub fn new() -> Self {
        Self::with_reader(FsReader)
    }
}

impl Default for ResultCache<FsReader> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: EntryReader> ResultCache<R> {
    pub fn with_reader(reader: R) -> Self {
        Self { reader, slot: None }
    }

    #[cfg(test)]
    fn reader(&self) -> &R {
        &self.reader
    }

    pub fn get_or_compute(&mut self, root: &Path, options: &TraversalOptions) -> &[String] {
        let hit = matches!(&self.slot, Some(slot) if slot.root == root);
        if hit {
            log::debug!("walk cache hit for {}", root.display());
        } else {
            log::debug!("walk cache miss for {}", root.display());
            let paths = walk_with(&self.reader, root, options);
            self.slot = Some(CacheSlot {
                root: root.to_path_buf(),
                paths,
            });
        }
        self.slot.as_ref().map(|slot| slot.paths.as_slice()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entries::DirEntryInfo;
    use crate::walk::EntryType;
    use std::cell::Cell;
    use std::fs;
    use tempfile::tempdir;

    #[derive(Default)]
    struct CountingReader {
        calls: Cell<usize>,
    }

    impl EntryReader for CountingReader {
        fn read_entries(&self, dir: &Path, include_files: bool) -> Vec<DirEntryInfo> {
            self.calls.set(self.calls.get() + 1);
            FsReader.read_entries(dir, include_files)
        }
    }

    #[test]
    fn same_root_is_read_once() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/x")).unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();

        let mut cache = ResultCache::with_reader(CountingReader::default());
        let first = cache
            .get_or_compute(dir.path(), &TraversalOptions::default())
            .to_vec();
        let reads = cache.reader().calls.get();
        assert!(reads > 0);

        let files = TraversalOptions {
            entry_type: EntryType::File,
            ..Default::default()
        };
        let second = cache.get_or_compute(dir.path(), &files).to_vec();

        assert_eq!(first, second);
        assert_eq!(cache.reader().calls.get(), reads);
    }

    #[test]
    fn other_root_evicts_the_slot() {
        let one = tempdir().unwrap();
        let two = tempdir().unwrap();
        fs::create_dir(one.path().join("alpha")).unwrap();
        fs::create_dir(two.path().join("beta")).unwrap();

        let mut cache = ResultCache::with_reader(CountingReader::default());
        let options = TraversalOptions::default();

        assert_eq!(cache.get_or_compute(one.path(), &options), ["alpha"]);
        assert_eq!(cache.get_or_compute(two.path(), &options), ["beta"]);
        let reads = cache.reader().calls.get();

        assert_eq!(cache.get_or_compute(one.path(), &options), ["alpha"]);
        assert!(cache.reader().calls.get() > reads);
    }

    #[test]
    fn stale_until_the_root_changes() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("first")).unwrap();

        let mut cache = ResultCache::new();
        let options = TraversalOptions::default();
        assert_eq!(cache.get_or_compute(dir.path(), &options), ["first"]);

        fs::create_dir(dir.path().join("second")).unwrap();
        assert_eq!(cache.get_or_compute(dir.path(), &options), ["first"]);
    }
}
