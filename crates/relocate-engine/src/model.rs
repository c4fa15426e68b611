//! Core data model: [`FileRef`], [`SpecifierKind`], [`Project`], [`MovePlanEntry`],
//! and the report the engine hands back to its caller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A normalised POSIX path relative to the workspace root.
///
/// Invariant: no `..` segments, no leading `/`, no backslashes; the
/// extension of the underlying file is preserved verbatim. Construct one via
/// [`crate::path_resolver::normalise`]; `new_unchecked` exists for tests and
/// fixtures that already hold a normalised value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileRef(String);

impl FileRef {
    pub fn new_unchecked(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// The final path segment, e.g. `"util.ts"` for `"libs/a/src/lib/util.ts"`.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// The file extension without the leading dot, if any.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        name.rsplit_once('.').map(|(_, ext)| ext)
    }

    /// The directory containing this file, or `None` if this is a root-level file.
    pub fn parent(&self) -> Option<FileRef> {
        self.0
            .rsplit_once('/')
            .map(|(dir, _)| FileRef(dir.to_string()))
    }

    /// Join a relative POSIX path onto this one, treating `self` as a directory.
    pub fn join(&self, rel: &str) -> FileRef {
        if self.0.is_empty() {
            FileRef(rel.to_string())
        } else {
            FileRef(format!("{}/{}", self.0, rel))
        }
    }

    /// True iff `self` is `other` or lives underneath the directory `other`.
    pub fn is_under(&self, other: &FileRef) -> bool {
        if other.0.is_empty() {
            return true;
        }
        self.0 == other.0 || self.0.starts_with(&format!("{}/", other.0))
    }

    /// Strip a leading directory prefix, returning the remainder without a
    /// leading slash. `None` if `self` is not under `prefix`.
    pub fn strip_prefix(&self, prefix: &FileRef) -> Option<&str> {
        if prefix.0.is_empty() {
            return Some(self.0.as_str());
        }
        self.0
            .strip_prefix(&prefix.0)
            .and_then(|rest| rest.strip_prefix('/'))
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FileRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Classification of the literal string inside an import/export/require/
/// dynamic-import form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecifierKind {
    /// Starts with `./` or `../`.
    Relative,
    /// Matches one of the configured alias patterns.
    Alias,
    /// Everything else, treated as external.
    Bare,
}

impl SpecifierKind {
    pub fn classify(text: &str) -> SpecifierKind {
        if text.starts_with("./") || text.starts_with("../") {
            SpecifierKind::Relative
        } else {
            // Alias vs. bare can only be decided against an alias table;
            // callers that have one should use `AliasTable::classify` instead.
            SpecifierKind::Bare
        }
    }
}

/// A project inside the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    pub root: FileRef,
    pub source_root: FileRef,
    pub alias: Option<String>,
    pub barrel: Option<FileRef>,
    pub kind: ProjectKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectKind {
    Library,
    Application,
}

/// One resolved entry in a move plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlanEntry {
    pub source: FileRef,
    pub target: FileRef,
    pub source_project: String,
    pub target_project: String,
    pub is_same_project: bool,
    pub is_barrel_move: bool,
    /// True when `target == source`: the planner still reports the entry,
    /// but the engine skips every mutation step for it.
    pub is_noop: bool,
}

/// One move the engine actually executed, for the caller's report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutedMove {
    pub source: FileRef,
    pub target: FileRef,
    pub files_rewritten: usize,
    pub barrels_touched: usize,
}

/// The engine's successful return value: the ordered list of moves it executed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveReport {
    pub moves: Vec<ExecutedMove>,
}

impl MoveReport {
    pub fn push(&mut self, executed: ExecutedMove) {
        self.moves.push(executed);
    }
}

/// Run-time knobs the embedding application constructs directly; there is no
/// file-based config loader here (workspace/alias discovery is out of scope).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub parallel_scan: bool,
    pub max_scan_tasks: usize,
    pub allow_unicode_default: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel_scan: true,
            max_scan_tasks: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            allow_unicode_default: false,
        }
    }
}

/// One caller-issued move request: comma-separated source patterns, a
/// target project, and the knobs from §6's "Engine inputs".
#[derive(Debug, Clone)]
pub struct MoveRequest {
    pub patterns: String,
    pub project: String,
    pub project_directory: Option<String>,
    pub derive_project_directory: bool,
    pub skip_export: bool,
    pub skip_format: bool,
    pub allow_unicode: bool,
    pub remove_empty_project: bool,
}

impl Default for MoveRequest {
    fn default() -> Self {
        Self {
            patterns: String::new(),
            project: String::new(),
            project_directory: None,
            derive_project_directory: false,
            skip_export: false,
            skip_format: false,
            allow_unicode: false,
            remove_empty_project: false,
        }
    }
}

/// The TS/JS source and barrel extensions the engine ever touches.
pub const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

pub fn is_source_extension(ext: &str) -> bool {
    SOURCE_EXTENSIONS.contains(&ext)
}
