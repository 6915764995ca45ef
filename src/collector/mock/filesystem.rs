//! In-memory mock filesystem for testing the accounting reader without sysfs.

use crate::collector::traits::FileSystem;
use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// In-memory filesystem for testing.
///
/// Besides static files, a path can hold a queue of contents: each read
/// returns the next entry and the last entry is returned forever after. This
/// simulates a counter that advances between the baseline and final reads.
/// Clones share the queues.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    /// Map from path to file contents.
    files: HashMap<PathBuf, String>,
    /// Map from path to successive file contents.
    sequences: Arc<Mutex<HashMap<PathBuf, VecDeque<String>>>>,
    /// Set of directories.
    directories: HashSet<PathBuf>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path, content.into());
    }

    /// Adds a file whose content changes on every read.
    pub fn add_sequence<I, S>(&mut self, path: impl AsRef<Path>, contents: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        let queue: VecDeque<String> = contents.into_iter().map(Into::into).collect();
        if let Ok(mut sequences) = self.sequences.lock() {
            sequences.insert(path, queue);
        }
    }

    /// Adds a counter file that yields `values` (in microjoules) on successive reads.
    pub fn add_counter(&mut self, path: impl AsRef<Path>, values: &[u64]) {
        self.add_sequence(path, values.iter().map(|v| format!("{}\n", v)));
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }

    fn next_in_sequence(&self, path: &Path) -> Option<String> {
        let mut sequences = self.sequences.lock().ok()?;
        let queue = sequences.get_mut(path)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }

    fn has_sequence(&self, path: &Path) -> bool {
        self.sequences
            .lock()
            .map(|s| s.get(path).is_some_and(|q| !q.is_empty()))
            .unwrap_or(false)
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        if let Some(content) = self.next_in_sequence(path) {
            return Ok(content);
        }
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.directories.contains(path) || self.has_sequence(path)
    }
}
