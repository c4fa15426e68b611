//! Move planner: turns a [`MoveRequest`] into an ordered, validated
//! [`MovePlanEntry`] batch.

use crate::error::{EngineError, EngineResult};
use crate::model::{FileRef, MovePlanEntry, MoveRequest};
use crate::path_resolver::ProjectTable;
use crate::tree::{ScanCache, Tree};
use globset::Glob;
use std::collections::HashMap;

const GLOB_METACHARS: &[char] = &['[', ']', '*', '?', '(', ')'];

fn is_glob_pattern(pattern: &str) -> bool {
    pattern.chars().any(|c| GLOB_METACHARS.contains(&c))
}

/// Expand one literal path or glob pattern against the known workspace file
/// list, in sorted POSIX order.
fn expand_pattern(pattern: &str, all_files: &[FileRef]) -> EngineResult<Vec<FileRef>> {
    if pattern.contains(',') {
        return Err(EngineError::invalid_path(
            pattern,
            "a literal comma is not allowed in a path (commas separate patterns)",
        ));
    }

    if is_glob_pattern(pattern) {
        let matcher = Glob::new(pattern)
            .map_err(|e| EngineError::invalid_path(pattern, format!("invalid glob: {e}")))?
            .compile_matcher();
        let mut matched: Vec<FileRef> = all_files
            .iter()
            .filter(|f| matcher.is_match(f.as_str()))
            .cloned()
            .collect();
        matched.sort();
        Ok(matched)
    } else {
        Ok(vec![crate::path_resolver::normalise(pattern)?])
    }
}

/// Resolve, validate, and order a batch of source patterns into a move plan.
/// Does not mutate the tree; purely a planning pass.
pub fn plan_move(
    request: &MoveRequest,
    tree: &Tree,
    cache: &ScanCache,
    projects: &ProjectTable,
) -> EngineResult<Vec<MovePlanEntry>> {
    let target_project = projects
        .get(&request.project)
        .ok_or_else(|| EngineError::project_not_found(request.project.clone()))?;

    let raw_patterns: Vec<&str> = request
        .patterns
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if raw_patterns.is_empty() {
        return Err(EngineError::no_match(request.patterns.clone()));
    }

    let all_files = cache.project_files("__workspace__", || {
        tree.list_recursive(&FileRef::new_unchecked(""))
    });

    let mut sources: Vec<FileRef> = Vec::new();
    for pattern in &raw_patterns {
        let expanded = expand_pattern(pattern, &all_files)?;
        if expanded.is_empty() {
            return Err(EngineError::no_match((*pattern).to_string()));
        }
        sources.extend(expanded);
    }
    sources.sort();
    sources.dedup();

    let mut entries = Vec::with_capacity(sources.len());
    let mut targets_seen: HashMap<FileRef, FileRef> = HashMap::new();

    for source in &sources {
        if !cache.exists(tree, source) {
            return Err(EngineError::source_not_found(source.clone()));
        }
        let source_project = projects.project_of(source).ok_or_else(|| {
            EngineError::project_not_found(format!("(no project owns {source})"))
        })?;

        let basename = source.file_name();
        if !request.allow_unicode && !basename.is_ascii() {
            return Err(EngineError::invalid_path(
                source.as_str(),
                "basename contains non-ASCII characters; pass allowUnicode to permit this",
            ));
        }

        let dir_segment = if let Some(dir) = &request.project_directory {
            dir.clone()
        } else if request.derive_project_directory {
            source
                .strip_prefix(&source_project.source_root)
                .and_then(|rest| rest.rsplit_once('/').map(|(dir, _)| dir.to_string()))
                .unwrap_or_default()
        } else {
            "lib".to_string()
        };

        let target = if dir_segment.is_empty() {
            target_project.source_root.join(basename)
        } else {
            target_project.source_root.join(&dir_segment).join(basename)
        };

        let is_noop = &target == source;

        if !is_noop {
            if let Some(existing_source) = targets_seen.get(&target) {
                return Err(EngineError::target_collision(
                    target.clone(),
                    vec![existing_source.clone(), source.clone()],
                ));
            }
            if cache.exists(tree, &target) {
                return Err(EngineError::target_collision(target.clone(), vec![source.clone()]));
            }
            targets_seen.insert(target.clone(), source.clone());
        }

        let is_same_project = source_project.name == target_project.name;
        let is_barrel_move = source_project
            .barrel
            .as_ref()
            .map(|b| b == source)
            .unwrap_or(false);

        entries.push(MovePlanEntry {
            source: source.clone(),
            target,
            source_project: source_project.name.clone(),
            target_project: target_project.name.clone(),
            is_same_project,
            is_barrel_move,
            is_noop,
        });
    }

    entries.sort_by(|a, b| a.source.cmp(&b.source));
    Ok(entries)
}
