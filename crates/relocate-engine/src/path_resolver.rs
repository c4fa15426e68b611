//! Path normalisation, project/alias lookup, and relative-specifier math.
//!
//! `ProjectTable` and `AliasTable` are the two "consumed" external interfaces
//! for this crate (§6): the caller builds them once per invocation
//! (workspace discovery and alias-config loading are out of scope here) and
//! hands them to the planner/engine.

use crate::error::{EngineError, EngineResult};
use crate::model::{FileRef, Project, SpecifierKind};
use indexmap::IndexMap;
use pathdiff::diff_paths;
use std::path::Path;

const GLOB_METACHARS: &[char] = &['[', ']', '*', '?', '(', ')'];

/// Normalise a path to a [`FileRef`]: POSIX slashes, collapsed `.`/`..`,
/// rejecting traversal past the workspace root, control characters, commas,
/// and glob metacharacters. This is the strict form used everywhere *except*
/// the planner's raw pattern-splitting step, which expands globs before any
/// individual path is normalised.
pub fn normalise(path: &str) -> EngineResult<FileRef> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(EngineError::invalid_path(path, "path is empty"));
    }
    if trimmed.contains('\\') {
        return Err(EngineError::invalid_path(
            path,
            "backslashes are not allowed; paths must use POSIX slashes",
        ));
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(EngineError::invalid_path(
            path,
            "control characters are not allowed in a path",
        ));
    }
    if trimmed.contains(',') {
        return Err(EngineError::invalid_path(
            path,
            "a literal comma is not allowed in a path (commas separate patterns)",
        ));
    }
    if trimmed.chars().any(|c| GLOB_METACHARS.contains(&c)) {
        return Err(EngineError::invalid_path(
            path,
            "glob metacharacters are not allowed in a resolved path",
        ));
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in trimmed.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                if segments.pop().is_none() {
                    return Err(EngineError::invalid_path(
                        path,
                        "path escapes the workspace root",
                    ));
                }
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return Err(EngineError::invalid_path(
            path,
            "path resolves to the workspace root, not a file",
        ));
    }

    Ok(FileRef::new_unchecked(segments.join("/")))
}

/// Static table of every project known for one engine invocation.
#[derive(Debug, Clone, Default)]
pub struct ProjectTable {
    projects: IndexMap<String, Project>,
}

impl ProjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, project: Project) {
        self.projects.insert(project.name.clone(), project);
    }

    pub fn get(&self, name: &str) -> Option<&Project> {
        self.projects.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    /// Longest-prefix match: the project whose root directory contains `file`.
    pub fn project_of(&self, file: &FileRef) -> Option<&Project> {
        self.projects
            .values()
            .filter(|p| file.is_under(&p.root))
            .max_by_key(|p| p.root.as_str().len())
    }
}

/// One alias pattern → target mapping.
#[derive(Debug, Clone)]
pub struct AliasEntry {
    pub project: String,
    /// Fixed text appended after the captured wildcard segment, if the
    /// pattern carries one (mirrors tsconfig `paths` replacement arrays).
    pub subpath_suffix: Option<String>,
}

/// Static table of alias patterns known for one engine invocation.
///
/// Patterns are tried in insertion order (first match wins), mirroring the
/// corpus's `IndexMap`-backed tsconfig `paths` matching: order is
/// significant because a wildcard pattern can shadow a more specific one.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    patterns: IndexMap<String, AliasEntry>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pattern: impl Into<String>, entry: AliasEntry) {
        self.patterns.insert(pattern.into(), entry);
    }

    /// Resolve a specifier against the alias patterns. Returns the target
    /// project name and, for wildcard patterns, the captured subpath.
    pub fn resolve(&self, specifier: &str) -> Option<(&str, Option<String>)> {
        for (pattern, entry) in &self.patterns {
            if let Some(star_idx) = pattern.find('*') {
                let prefix = &pattern[..star_idx];
                let suffix = &pattern[star_idx + 1..];
                if specifier.starts_with(prefix)
                    && specifier.ends_with(suffix)
                    && specifier.len() >= prefix.len() + suffix.len()
                {
                    let captured = &specifier[prefix.len()..specifier.len() - suffix.len()];
                    return Some((entry.project.as_str(), Some(captured.to_string())));
                }
            } else if pattern == specifier {
                return Some((entry.project.as_str(), None));
            }
        }
        None
    }

    /// True iff `specifier` matches a known alias pattern.
    pub fn is_alias(&self, specifier: &str) -> bool {
        self.resolve(specifier).is_some()
    }

    /// The inverse of [`AliasTable::resolve`]'s wildcard case: given a
    /// project name and a file's POSIX path relative to that project's
    /// source root (with an elidable TS/JS extension already stripped),
    /// reconstruct the specifier a consumer would use to import it
    /// directly through a wildcard alias pattern: a "deep import" that
    /// bypasses the project's barrel entirely. `None` if no wildcard
    /// pattern targets `project`; first match wins, mirroring `resolve`.
    pub fn deep_specifier_for(&self, project: &str, subpath_no_ext: &str) -> Option<String> {
        self.patterns.iter().find_map(|(pattern, entry)| {
            if entry.project != project {
                return None;
            }
            let star_idx = pattern.find('*')?;
            let prefix = &pattern[..star_idx];
            let suffix = &pattern[star_idx + 1..];
            Some(format!("{prefix}{subpath_no_ext}{suffix}"))
        })
    }

    pub fn classify(&self, specifier: &str) -> SpecifierKind {
        if specifier.starts_with("./") || specifier.starts_with("../") {
            SpecifierKind::Relative
        } else if self.is_alias(specifier) {
            SpecifierKind::Alias
        } else {
            SpecifierKind::Bare
        }
    }
}

pub fn alias_for(project: &Project) -> Option<&str> {
    project.alias.as_deref()
}

pub fn barrel_of(project: &Project) -> Option<&FileRef> {
    project.barrel.as_ref()
}

/// The extensions an import specifier omits even though the file on disk
/// carries one; `.mjs`/`.cjs` are always written out in full.
const ELIDED_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx"];

/// Strip a trailing elidable extension (`.ts`/`.tsx`/`.js`/`.jsx`) from a
/// POSIX path, leaving `.mjs`/`.cjs` untouched. Shared by the relative- and
/// deep-alias specifier builders so both elide consistently.
pub fn strip_elidable_extension(path: &str) -> &str {
    for ext in ELIDED_EXTENSIONS {
        if let Some(stripped) = path.strip_suffix(ext) {
            return stripped;
        }
    }
    path
}

/// Compute a POSIX relative specifier from `from_file`'s directory to
/// `to_file`, starting with `./` or `../`, stripping an elidable extension
/// from the target leaf.
pub fn relative_specifier(from_file: &FileRef, to_file: &FileRef) -> String {
    let from_dir = from_file.parent().unwrap_or_else(|| FileRef::new_unchecked(""));
    let from_dir_path = Path::new(from_dir.as_str());
    let to_path = Path::new(to_file.as_str());

    let diff = diff_paths(to_path, from_dir_path).unwrap_or_else(|| to_path.to_path_buf());
    let mut rel = diff.to_string_lossy().replace('\\', "/");

    for ext in ELIDED_EXTENSIONS {
        if let Some(stripped) = rel.strip_suffix(ext) {
            rel = stripped.to_string();
            break;
        }
    }

    if !rel.starts_with("./") && !rel.starts_with("../") {
        rel = format!("./{}", rel);
    }

    rel
}
