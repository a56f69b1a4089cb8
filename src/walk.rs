// Depth-bounded directory walk that feeds the path prompts.
//
// The walk is an explicit loop over a work-list. The first child of the
// directory being examined is always descended into next, and its remaining
// siblings go to the front of the pending queue, ahead of older deferred
// branches. Children found at the depth limit are never read; they are kept
// as leaves and appended after everything that was traversed.

use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::entries::{EntryReader, FsReader};

/// Which kinds of nodes end up in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryType {
    File,
    #[default]
    Directory,
    Both,
}

impl EntryType {
    fn includes_files(self) -> bool {
        self != EntryType::Directory
    }

    /// Directories are still descended into in `File` mode, just never reported.
    fn emits(self, is_directory: bool) -> bool {
        !(self == EntryType::File && is_directory)
    }
}

/// Predicate over a root-relative path. Returning true prunes the node
/// together with its whole subtree, before it is ever read.
pub type ExcludeFn = Box<dyn Fn(&str) -> bool>;

/// Skips dependency and VCS internals.
pub fn default_exclude(path: &str) -> bool {
    path.contains("node_modules") || path.contains(".git")
}

pub struct TraversalOptions {
    pub entry_type: EntryType,
    /// Report `x` instead of `a/x`.
    pub base_name_only: bool,
    /// Levels below the root to list. `None` and `Some(0)` both walk the
    /// whole tree.
    pub depth_limit: Option<usize>,
    pub exclude_path: ExcludeFn,
    /// Prepend `root_sentinel_label` as the very first entry.
    pub include_root_sentinel: bool,
    pub root_sentinel_label: String,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self {
            entry_type: EntryType::Directory,
            base_name_only: false,
            depth_limit: Some(3),
            exclude_path: Box::new(default_exclude),
            include_root_sentinel: false,
            root_sentinel_label: ".".to_string(),
        }
    }
}

impl fmt::Debug for TraversalOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraversalOptions")
            .field("entry_type", &self.entry_type)
            .field("base_name_only", &self.base_name_only)
            .field("depth_limit", &self.depth_limit)
            .field("include_root_sentinel", &self.include_root_sentinel)
            .field("root_sentinel_label", &self.root_sentinel_label)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("file name is not valid UTF-8: {}", .path.display())]
    NonUtf8Path { path: PathBuf },
}

/// A node waiting to be descended into. `depth` is the depth its own
/// children will have.
#[derive(Debug, Clone, PartialEq, Eq)]
struct QueueEntry {
    relative_path: String,
    is_directory: bool,
    depth: usize,
}

/// The next node to visit: a child of the directory just read, or a branch
/// deferred earlier.
#[derive(Debug)]
enum Candidate {
    Fresh {
        relative_path: String,
        is_directory: bool,
    },
    Queued(QueueEntry),
}

impl Candidate {
    fn into_entry(self, current_depth: usize) -> QueueEntry {
        match self {
            Candidate::Fresh {
                relative_path,
                is_directory,
            } => QueueEntry {
                relative_path,
                is_directory,
                depth: current_depth + 1,
            },
            Candidate::Queued(entry) => entry,
        }
    }
}

struct TraversalState<'a> {
    root: &'a Path,
    results: Vec<String>,
    leaves: Vec<String>,
    pending: VecDeque<QueueEntry>,
    current_depth: usize,
}

impl<'a> TraversalState<'a> {
    fn new(root: &'a Path) -> Self {
        Self {
            root,
            results: Vec::new(),
            leaves: Vec::new(),
            pending: VecDeque::new(),
            current_depth: 1,
        }
    }

    fn absolute(&self, relative: &str) -> PathBuf {
        if relative.is_empty() {
            self.root.to_path_buf()
        } else {
            self.root.join(relative)
        }
    }

    /// Lists `dir` as root-relative candidates with excluded ones pruned.
    fn children<R: EntryReader>(
        &self,
        reader: &R,
        dir: &str,
        options: &TraversalOptions,
    ) -> Result<VecDeque<Candidate>, WalkError> {
        let mut children = VecDeque::new();
        for info in reader.read_entries(&self.absolute(dir), options.entry_type.includes_files()) {
            let relative_path = Path::new(dir)
                .join(&info.name)
                .into_os_string()
                .into_string()
                .map_err(|raw| WalkError::NonUtf8Path {
                    path: self.root.join(raw),
                })?;
            if (options.exclude_path)(&relative_path) {
                continue;
            }
            children.push_back(Candidate::Fresh {
                relative_path,
                is_directory: info.is_directory,
            });
        }
        Ok(children)
    }

    /// Keeps the remaining siblings of the selected child ahead of older branches.
    fn requeue(&mut self, siblings: VecDeque<Candidate>) {
        for sibling in siblings.into_iter().rev() {
            self.pending.push_front(sibling.into_entry(self.current_depth));
        }
    }

    fn finish(self, options: &TraversalOptions) -> Vec<String> {
        let mut paths = self.results;
        paths.extend(self.leaves);
        if options.base_name_only {
            paths = paths.into_iter().map(base_name).collect();
        }
        if options.include_root_sentinel {
            paths.insert(0, options.root_sentinel_label.clone());
        }
        paths
    }
}

fn base_name(path: String) -> String {
    match Path::new(&path).file_name().and_then(|name| name.to_str()) {
        Some(name) => name.to_string(),
        None => path,
    }
}

/// Walks `root` and returns the matching paths relative to it.
///
/// Any failure aborts the whole walk: the error is logged and an empty list
/// is returned, with no partial results. Callers that must tell an aborted
/// walk apart from an empty tree use [`try_walk`].
pub fn walk(root: &Path, options: &TraversalOptions) -> Vec<String> {
    walk_with(&FsReader, root, options)
}

pub fn walk_with<R: EntryReader>(reader: &R, root: &Path, options: &TraversalOptions) -> Vec<String> {
    match try_walk_with(reader, root, options) {
        Ok(paths) => paths,
        Err(e) => {
            log::error!("walk of {} aborted: {}", root.display(), e);
            Vec::new()
        }
    }
}

pub fn try_walk(root: &Path, options: &TraversalOptions) -> Result<Vec<String>, WalkError> {
    try_walk_with(&FsReader, root, options)
}

pub fn try_walk_with<R: EntryReader>(
    reader: &R,
    root: &Path,
    options: &TraversalOptions,
) -> Result<Vec<String>, WalkError> {
    let limit = options.depth_limit.filter(|&n| n > 0);
    let mut state = TraversalState::new(root);
    let mut dir = String::new();
    let mut readable = true;

    loop {
        let mut children = if readable {
            state.children(reader, &dir, options)?
        } else {
            VecDeque::new()
        };

        if limit == Some(state.current_depth) {
            for child in children.drain(..) {
                if let Candidate::Fresh {
                    relative_path,
                    is_directory,
                } = child
                {
                    if options.entry_type.emits(is_directory) {
                        state.leaves.push(relative_path);
                    }
                }
            }
        }

        let next = match children.pop_front() {
            Some(first) => {
                state.requeue(children);
                first
            }
            None => match state.pending.pop_front() {
                Some(entry) => Candidate::Queued(entry),
                None => break,
            },
        };

        let entry = next.into_entry(state.current_depth);
        state.current_depth = entry.depth;
        if options.entry_type.emits(entry.is_directory) {
            state.results.push(entry.relative_path.clone());
        }
        readable = entry.is_directory;
        dir = entry.relative_path;
    }

    Ok(state.finish(options))
}
