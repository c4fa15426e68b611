//! In-memory overlay of the workspace filesystem, plus the per-run scan
//! caches that sit on top of it.
//!
//! The overlay itself never performs I/O: it is a plain owning map (§9
//! design note) layered, optionally, over a read-through view of a real
//! directory for files that have not yet been staged. The one place real
//! I/O happens is [`crate::fs_adapter`], which is async and lives outside
//! this module entirely.

use crate::model::FileRef;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Entry {
    Present(Vec<u8>),
    Deleted,
}

/// `FileRef → Present(bytes) | Deleted`, optionally backed by a read-through
/// view of a real directory.
pub struct Tree {
    base_dir: Option<PathBuf>,
    overlay: HashMap<FileRef, Entry>,
}

impl Tree {
    /// A pure in-memory tree with no filesystem backing, used by unit tests
    /// and by any caller that seeds content itself via [`Tree::seed`].
    pub fn in_memory() -> Self {
        Self {
            base_dir: None,
            overlay: HashMap::new(),
        }
    }

    /// A tree backed by a real directory: reads and directory listings fall
    /// through to disk for anything not already staged in the overlay.
    pub fn from_dir(root: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(root.into()),
            overlay: HashMap::new(),
        }
    }

    /// Seed the overlay directly with content, bypassing any backing
    /// directory. Intended for test fixtures.
    pub fn seed(&mut self, file: FileRef, bytes: impl Into<Vec<u8>>) {
        self.overlay.insert(file, Entry::Present(bytes.into()));
    }

    pub fn base_dir(&self) -> Option<&PathBuf> {
        self.base_dir.as_ref()
    }

    /// Every path staged in the overlay, along with whether it is present
    /// or deleted. Used by the filesystem flush adapter.
    pub fn staged(&self) -> impl Iterator<Item = (&FileRef, bool)> {
        self.overlay
            .iter()
            .map(|(f, e)| (f, matches!(e, Entry::Present(_))))
    }

    pub fn read(&self, file: &FileRef) -> Option<Vec<u8>> {
        match self.overlay.get(file) {
            Some(Entry::Present(bytes)) => Some(bytes.clone()),
            Some(Entry::Deleted) => None,
            None => self
                .base_dir
                .as_ref()
                .and_then(|root| std::fs::read(root.join(file.as_str())).ok()),
        }
    }

    pub fn write(&mut self, file: FileRef, bytes: impl Into<Vec<u8>>) {
        // Parent directories are implicit in a flat map; nothing to create.
        self.overlay.insert(file, Entry::Present(bytes.into()));
    }

    pub fn delete(&mut self, file: &FileRef) {
        self.overlay.insert(file.clone(), Entry::Deleted);
    }

    pub fn exists(&self, file: &FileRef) -> bool {
        match self.overlay.get(file) {
            Some(Entry::Present(_)) => true,
            Some(Entry::Deleted) => false,
            None => self
                .base_dir
                .as_ref()
                .map(|root| root.join(file.as_str()).exists())
                .unwrap_or(false),
        }
    }

    /// All present (non-deleted) files under `dir`, in sorted POSIX order.
    pub fn list_recursive(&self, dir: &FileRef) -> Vec<FileRef> {
        let mut seen: HashMap<FileRef, bool> = HashMap::new();

        if let Some(root) = &self.base_dir {
            let abs_dir = root.join(dir.as_str());
            if abs_dir.is_dir() {
                let walker = ignore::WalkBuilder::new(&abs_dir).hidden(false).build();
                for entry in walker.flatten() {
                    if entry.path().is_file() {
                        if let Ok(rel) = entry.path().strip_prefix(root) {
                            if let Some(rel_str) = rel.to_str() {
                                seen.insert(FileRef::new_unchecked(rel_str.replace('\\', "/")), true);
                            }
                        }
                    }
                }
            }
        }

        for (f, e) in &self.overlay {
            if f.is_under(dir) {
                seen.insert(f.clone(), matches!(e, Entry::Present(_)));
            }
        }

        let mut result: Vec<FileRef> = seen
            .into_iter()
            .filter(|(_, present)| *present)
            .map(|(f, _)| f)
            .collect();
        result.sort();
        result
    }
}

/// The per-engine-run caches layered on top of a [`Tree`]: content,
/// existence, per-project file lists, and the scanner's negative-hit cache.
///
/// Modeled as plain owning maps behind a `Mutex` each, the same
/// `Arc<Mutex<HashMap<_, _>>>` idiom this codebase uses for its tsconfig and
/// import caches, so the parallel substring pre-filter can share a
/// read-only view of content across scanning threads.
#[derive(Default)]
pub struct ScanCache {
    content: Mutex<HashMap<FileRef, Vec<u8>>>,
    existence: Mutex<HashMap<FileRef, bool>>,
    project_files: Mutex<HashMap<String, Vec<FileRef>>>,
    negative_hits: Mutex<HashSet<(FileRef, String)>>,
}

impl ScanCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self, tree: &Tree, file: &FileRef) -> Option<Vec<u8>> {
        if let Some(bytes) = self.content.lock().unwrap().get(file) {
            return Some(bytes.clone());
        }
        let bytes = tree.read(file)?;
        self.content
            .lock()
            .unwrap()
            .insert(file.clone(), bytes.clone());
        Some(bytes)
    }

    pub fn exists(&self, tree: &Tree, file: &FileRef) -> bool {
        if let Some(found) = self.existence.lock().unwrap().get(file) {
            return *found;
        }
        let found = tree.exists(file);
        self.existence.lock().unwrap().insert(file.clone(), found);
        found
    }

    pub fn project_files<F>(&self, project: &str, compute: F) -> Vec<FileRef>
    where
        F: FnOnce() -> Vec<FileRef>,
    {
        if let Some(files) = self.project_files.lock().unwrap().get(project) {
            return files.clone();
        }
        let files = compute();
        self.project_files
            .lock()
            .unwrap()
            .insert(project.to_string(), files.clone());
        files
    }

    pub fn is_known_negative(&self, file: &FileRef, specifier: &str) -> bool {
        self.negative_hits
            .lock()
            .unwrap()
            .contains(&(file.clone(), specifier.to_string()))
    }

    pub fn mark_negative(&self, file: &FileRef, specifier: &str) {
        self.negative_hits
            .lock()
            .unwrap()
            .insert((file.clone(), specifier.to_string()));
    }

    /// Drop any cached state for `file`, and invalidate `project`'s cached
    /// file list since its membership may have changed. Called after every
    /// write/delete on the overlay that owns this cache.
    pub fn invalidate(&self, file: &FileRef, project: Option<&str>) {
        self.content.lock().unwrap().remove(file);
        self.existence.lock().unwrap().remove(file);
        self.negative_hits.lock().unwrap().retain(|(f, _)| f != file);
        if let Some(project) = project {
            self.project_files.lock().unwrap().remove(project);
        }
    }
}
