//! The move engine (§4.7): for each planned move, relocate the file inside
//! the tree overlay, rewrite the moved file's own imports, walk the
//! workspace rewriting every other affected specifier, and reconcile both
//! projects' barrels.
//!
//! Per §5 the engine is single-threaded cooperative with respect to the
//! overlay: one move is in flight at a time, and within a move, every file
//! visit that can mutate the overlay is serial. Only the scanner's cheap
//! substring pre-filter is allowed to fan out across files (`EngineConfig
//! ::parallel_scan`), and it always completes before the rewriter touches
//! anything, see [`crate::scanner::find_referencing_files`].

use std::collections::HashMap;

use crate::barrel;
use crate::error::{EngineError, EngineResult};
use crate::model::{is_source_extension, EngineConfig, ExecutedMove, FileRef, MovePlanEntry, MoveReport, MoveRequest};
use crate::path_resolver::{self, AliasTable, ProjectTable};
use crate::planner;
use crate::rewriter;
use crate::scanner;
use crate::tree::{ScanCache, Tree};

/// Owns the two static tables (§6 "consumed" interfaces) for one engine
/// invocation and drives planning + execution over a caller-supplied
/// overlay. Stateless beyond those tables: the overlay and its caches are
/// threaded through every call instead of being owned here, so a caller can
/// run several invocations against the same tree without re-building the
/// engine.
pub struct MoveEngine<'a> {
    projects: &'a ProjectTable,
    aliases: &'a AliasTable,
    config: EngineConfig,
}

impl<'a> MoveEngine<'a> {
    pub fn new(projects: &'a ProjectTable, aliases: &'a AliasTable, config: EngineConfig) -> Self {
        Self {
            projects,
            aliases,
            config,
        }
    }

    /// Plan and then execute a move request against `tree`. On success the
    /// overlay holds every staged mutation for the whole batch and the
    /// returned [`MoveReport`] lists the moves in execution order. On
    /// failure the overlay retains whatever had already been staged for
    /// earlier entries in the batch; discarding it is the caller's job
    /// (§4.7: "partial mutations already staged in the overlay remain;
    /// persistence and rollback are the caller's concern").
    pub fn execute(&self, tree: &mut Tree, cache: &ScanCache, request: &MoveRequest) -> EngineResult<MoveReport> {
        let plan = planner::plan_move(request, tree, cache, self.projects)?;
        self.execute_plan(tree, cache, &plan, request)
    }

    /// Execute an already-resolved plan. Exposed separately so a caller can
    /// print a dry-run preview of `plan` before committing to mutation.
    pub fn execute_plan(
        &self,
        tree: &mut Tree,
        cache: &ScanCache,
        plan: &[MovePlanEntry],
        request: &MoveRequest,
    ) -> EngineResult<MoveReport> {
        let mut report = MoveReport::default();

        for entry in plan {
            if entry.is_noop {
                tracing::debug!(source = %entry.source, "move is a no-op, skipping");
                continue;
            }

            let _span = relocate_foundation::logging::move_span(entry.source.as_str(), entry.target.as_str());
            let executed = self.execute_entry(tree, cache, entry, request)?;
            report.push(executed);
        }

        Ok(report)
    }

    fn execute_entry(
        &self,
        tree: &mut Tree,
        cache: &ScanCache,
        entry: &MovePlanEntry,
        request: &MoveRequest,
    ) -> EngineResult<ExecutedMove> {
        let source_project = self
            .projects
            .get(&entry.source_project)
            .ok_or_else(|| EngineError::project_not_found(entry.source_project.clone()))?;
        let target_project = self
            .projects
            .get(&entry.target_project)
            .ok_or_else(|| EngineError::project_not_found(entry.target_project.clone()))?;

        // Step 1-2: relocate inside the overlay.
        let bytes = tree
            .read(&entry.source)
            .ok_or_else(|| EngineError::source_not_found(entry.source.clone()))?;
        tree.write(entry.target.clone(), bytes);
        tree.delete(&entry.source);

        // Step 3: invalidate caches for both projects and both paths.
        cache.invalidate(&entry.source, Some(&entry.source_project));
        cache.invalidate(&entry.target, Some(&entry.target_project));

        let source_alias = source_project.alias.clone();
        let target_alias = target_project.alias.clone();

        // A barrel re-export resolves to the moved file regardless of
        // whether the move crosses projects, so this check has to happen
        // before the barrel gets touched below.
        let source_was_exported = source_project
            .barrel
            .as_ref()
            .filter(|barrel| *barrel != &entry.source)
            .and_then(|barrel| tree.read(barrel))
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .map(|content| {
                let rel = path_resolver::relative_specifier(
                    source_project.barrel.as_ref().unwrap(),
                    &entry.source,
                );
                barrel::has_export(&content, &rel)
            })
            .unwrap_or(false);

        // Step 4: rewrite the moved file's own imports, relative to its new home.
        let files_rewritten_own = self.rewrite_moved_file_own_imports(tree, cache, entry, source_project);

        // Whether the target ends up exported by its barrel is decided by
        // the §4.5 policy matrix below; alias consumers need to know this
        // before we can compute their replacement specifier.
        let will_export_target = source_was_exported && !entry.is_barrel_move && (entry.is_same_project || !request.skip_export);

        let files_rewritten_workspace = self.rewrite_workspace(
            tree,
            cache,
            entry,
            source_project,
            target_project,
            source_alias.as_deref(),
            target_alias.as_deref(),
            source_was_exported,
            will_export_target,
        )?;

        // Step 7: barrel reconciliation.
        let barrels_touched = self.update_barrels(tree, entry, source_project, target_project, source_was_exported, request.skip_export)?;

        // Step 8: optionally remove an emptied source project.
        if request.remove_empty_project && !entry.is_same_project {
            self.maybe_remove_empty_project(tree, cache, source_project.name.as_str(), &source_project.root, source_project.barrel.as_ref());
        }

        Ok(ExecutedMove {
            source: entry.source.clone(),
            target: entry.target.clone(),
            files_rewritten: files_rewritten_own + files_rewritten_workspace,
            barrels_touched,
        })
    }

    /// §4.4 "Rewrite semantics for the moved file S itself": recompute
    /// every relative specifier in the moved file's own text against its
    /// new location, and promote any specifier that pointed at a sibling in
    /// the *origin* project to an alias import back into that project when
    /// the move crosses a project boundary *and* the sibling is actually
    /// re-exported by the origin's barrel (§8/S3); otherwise a bare alias
    /// import would dangle, so fall back to a relative path that walks
    /// back across the project boundary.
    fn rewrite_moved_file_own_imports(
        &self,
        tree: &mut Tree,
        cache: &ScanCache,
        entry: &MovePlanEntry,
        source_project: &crate::model::Project,
    ) -> usize {
        let Some(bytes) = tree.read(&entry.target) else {
            return 0;
        };
        let Ok(text) = String::from_utf8(bytes) else {
            return 0;
        };
        let Some(ext) = entry.target.extension() else {
            return 0;
        };
        let Some(refs) = crate::ast::parse_references(&text, ext) else {
            tracing::debug!(file = %entry.target, "parse error rewriting moved file's own imports");
            return 0;
        };

        let mut map: HashMap<String, String> = HashMap::new();
        for r in &refs {
            if r.specifier.starts_with("./") || r.specifier.starts_with("../") {
                // The specifier was written relative to the file's *old*
                // directory; resolve it there to find the sibling it names,
                // then decide how to reach that sibling from the new home.
                let old_dir = entry.source.parent().unwrap_or_else(|| FileRef::new_unchecked(""));
                let sibling = resolve_relative(&old_dir, &r.specifier);

                if entry.is_same_project {
                    let new_specifier = path_resolver::relative_specifier(&entry.target, &sibling);
                    map.insert(r.specifier.clone(), new_specifier);
                } else {
                    let sibling_exported = source_project
                        .barrel
                        .as_ref()
                        .filter(|barrel| *barrel != &sibling)
                        .and_then(|barrel| tree.read(barrel))
                        .and_then(|bytes| String::from_utf8(bytes).ok())
                        .map(|content| {
                            let rel =
                                path_resolver::relative_specifier(source_project.barrel.as_ref().unwrap(), &sibling);
                            barrel::has_export(&content, &rel)
                        })
                        .unwrap_or(false);

                    let new_specifier = match (source_project.alias.as_deref(), sibling_exported) {
                        // Crossing projects: a sibling in the origin project
                        // is no longer reachable by a relative path, so the
                        // moved file now imports it back via the origin's
                        // alias — but only when that alias actually resolves
                        // to the sibling, i.e. the origin barrel re-exports
                        // it.
                        (Some(alias), true) => alias.to_string(),
                        // No alias for the origin project, or the sibling
                        // isn't re-exported: fall back to a relative path
                        // that walks back across the project boundary.
                        _ => path_resolver::relative_specifier(&entry.target, &sibling),
                    };
                    map.insert(r.specifier.clone(), new_specifier);
                }
            }
        }

        if map.is_empty() {
            return 0;
        }
        if rewriter::rewrite(tree, cache, &entry.target, &map) {
            1
        } else {
            0
        }
    }

    /// Steps 5-6: scan and rewrite every other file in the workspace.
    fn rewrite_workspace(
        &self,
        tree: &mut Tree,
        cache: &ScanCache,
        entry: &MovePlanEntry,
        source_project: &crate::model::Project,
        target_project: &crate::model::Project,
        source_alias: Option<&str>,
        target_alias: Option<&str>,
        source_was_exported: bool,
        will_export_target: bool,
    ) -> EngineResult<usize> {
        let mut rewritten = 0usize;

        // Relative-specifier consumers: scoped to files that lived in the
        // source or target project, since a relative specifier can only
        // ever resolve from within one of those two trees.
        let mut project_files: Vec<FileRef> = cache.project_files(&entry.source_project, || {
            tree.list_recursive(&self.projects.get(&entry.source_project).unwrap().root)
        });
        if !entry.is_same_project {
            project_files.extend(cache.project_files(&entry.target_project, || {
                tree.list_recursive(&self.projects.get(&entry.target_project).unwrap().root)
            }));
        }
        project_files.sort();
        project_files.dedup();

        // Barrels are never treated as generic relative consumers: they are
        // re-export lists maintained exclusively by `update_barrels` below,
        // and letting this pass retarget a barrel's export line would leave
        // it holding a specifier `update_barrels`'s own matching no longer
        // recognises as the moved module.
        let is_barrel_file = |f: &FileRef| {
            source_project.barrel.as_ref() == Some(f) || target_project.barrel.as_ref() == Some(f)
        };

        // The scan here is a pure read over the overlay (§5: "the cheap
        // substring pass ... may be executed in parallel across files with
        // a shared read-only view of the content cache"); reborrow `tree`
        // as shared once so every chunk closure can copy that reference in
        // rather than fight over the one `&mut Tree` the caller handed us.
        let shared_tree: &Tree = tree;

        let candidate_files: Vec<(FileRef, String)> = if self.config.parallel_scan && project_files.len() > 1 {
            std::thread::scope(|scope| {
                let chunk_count = project_files.len().min(self.config.max_scan_tasks.max(1));
                let chunk_size = project_files.len().div_ceil(chunk_count.max(1));
                let handles: Vec<_> = project_files
                    .chunks(chunk_size.max(1))
                    .map(|chunk| {
                        scope.spawn(move || {
                            chunk
                                .iter()
                                .filter(|f| **f != entry.target && !is_barrel_file(f))
                                .filter_map(|f| {
                                    let rel = path_resolver::relative_specifier(f, &entry.source);
                                    if scanner::file_references(shared_tree, cache, f, std::slice::from_ref(&rel)) {
                                        Some((f.clone(), rel))
                                    } else {
                                        None
                                    }
                                })
                                .collect::<Vec<_>>()
                        })
                    })
                    .collect();
                handles.into_iter().flat_map(|h| h.join().unwrap_or_default()).collect()
            })
        } else {
            project_files
                .iter()
                .filter(|f| **f != entry.target && !is_barrel_file(f))
                .filter_map(|f| {
                    let rel = path_resolver::relative_specifier(f, &entry.source);
                    if scanner::file_references(shared_tree, cache, f, std::slice::from_ref(&rel)) {
                        Some((f.clone(), rel))
                    } else {
                        None
                    }
                })
                .collect()
        };

        let mut candidate_files = candidate_files;
        candidate_files.sort_by(|a, b| a.0.cmp(&b.0));

        for (file, old_rel) in candidate_files {
            let new_specifier = if entry.is_same_project {
                path_resolver::relative_specifier(&file, &entry.target)
            } else if will_export_target {
                target_alias
                    .map(|a| a.to_string())
                    .unwrap_or_else(|| path_resolver::relative_specifier(&file, &entry.target))
            } else {
                path_resolver::relative_specifier(&file, &entry.target)
            };

            let mut map = HashMap::new();
            map.insert(old_rel, new_specifier);
            if rewriter::rewrite(tree, cache, &file, &map) {
                rewritten += 1;
            }
        }

        // Bare alias-specifier consumers: any file in the workspace
        // (outside the source project, by the no-self-alias-import
        // invariant) that imports the source project's barrel wholesale
        // and happens to resolve `util` through it.
        if source_was_exported {
            if let Some(alias) = source_alias {
                let resolved_new = will_export_target.then_some(target_alias).flatten();
                rewritten += self.rewrite_global_specifier(tree, cache, entry, alias, resolved_new);
            }
        }

        // Deep wildcard-alias consumers: a project can configure a
        // `"@w/a/*"`-style path alias that lets callers import a file
        // directly without going through the barrel at all. That route is
        // independent of whether the barrel re-exports anything, so it is
        // checked unconditionally rather than gated on `source_was_exported`.
        if let Some(source_subpath) = entry.source.strip_prefix(&source_project.source_root) {
            let source_subpath = path_resolver::strip_elidable_extension(source_subpath);
            if let Some(deep_old) = self.aliases.deep_specifier_for(&entry.source_project, source_subpath) {
                let deep_new = entry.target.strip_prefix(&target_project.source_root).and_then(|target_subpath| {
                    let target_subpath = path_resolver::strip_elidable_extension(target_subpath);
                    self.aliases.deep_specifier_for(&entry.target_project, target_subpath)
                });
                rewritten += self.rewrite_global_specifier(tree, cache, entry, &deep_old, deep_new.as_deref());
            }
        }

        Ok(rewritten)
    }

    /// Rewrite every workspace consumer (other than the moved file itself)
    /// of one fixed, non-relative specifier string (a project's bare alias
    /// or a deep wildcard-alias import) to `new_specifier` when it is
    /// known to still resolve, or else to a relative path computed per
    /// consuming file as a fallback that at least preserves resolution.
    ///
    /// A consumer that itself lives in the target project is never given
    /// `new_specifier` even when it resolves: that would be a self-alias
    /// import into the consumer's own project, which §3's "no self-alias
    /// imports" invariant forbids, so such a consumer always gets a
    /// relative specifier instead.
    fn rewrite_global_specifier(
        &self,
        tree: &mut Tree,
        cache: &ScanCache,
        entry: &MovePlanEntry,
        old_specifier: &str,
        new_specifier: Option<&str>,
    ) -> usize {
        let matches = scanner::find_referencing_files(
            tree,
            cache,
            &[FileRef::new_unchecked("")],
            &[old_specifier.to_string()],
            self.config.parallel_scan,
        );

        let mut rewritten = 0;
        for file in matches {
            if file == entry.target {
                continue;
            }
            let consumer_in_target_project =
                self.projects.project_of(&file).map(|p| p.name.as_str()) == Some(entry.target_project.as_str());

            let replacement = if consumer_in_target_project {
                path_resolver::relative_specifier(&file, &entry.target)
            } else {
                new_specifier
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| path_resolver::relative_specifier(&file, &entry.target))
            };
            let mut map = HashMap::new();
            map.insert(old_specifier.to_string(), replacement);
            if rewriter::rewrite(tree, cache, &file, &map) {
                rewritten += 1;
            }
        }
        rewritten
    }

    /// §4.5 policy matrix.
    fn update_barrels(
        &self,
        tree: &mut Tree,
        entry: &MovePlanEntry,
        source_project: &crate::model::Project,
        target_project: &crate::model::Project,
        source_was_exported: bool,
        skip_export: bool,
    ) -> EngineResult<usize> {
        if !source_was_exported || entry.is_barrel_move {
            return Ok(0);
        }

        let mut touched = 0;
        let source_barrel = source_project.barrel.as_ref().unwrap();

        if entry.is_same_project {
            let old_rel = path_resolver::relative_specifier(source_barrel, &entry.source);
            let new_rel = path_resolver::relative_specifier(source_barrel, &entry.target);
            let content = String::from_utf8(tree.read(source_barrel).unwrap_or_default()).unwrap_or_default();
            let (new_content, changed) = barrel::rewrite_export_path(&content, &old_rel, &new_rel);
            if changed {
                tree.write(source_barrel.clone(), new_content.into_bytes());
                touched += 1;
            }
            return Ok(touched);
        }

        let old_rel = path_resolver::relative_specifier(source_barrel, &entry.source);
        let content = String::from_utf8(tree.read(source_barrel).unwrap_or_default()).unwrap_or_default();
        let (new_content, changed) = barrel::remove_export(&content, &old_rel);
        if changed {
            tree.write(source_barrel.clone(), new_content.into_bytes());
            touched += 1;
        }

        if !skip_export {
            if let Some(target_barrel) = target_project.barrel.as_ref() {
                let new_rel = path_resolver::relative_specifier(target_barrel, &entry.target);
                let content = String::from_utf8(tree.read(target_barrel).unwrap_or_default()).unwrap_or_default();
                let (new_content, changed) = barrel::add_export(&content, &new_rel);
                if changed {
                    tree.write(target_barrel.clone(), new_content.into_bytes());
                    touched += 1;
                }
            }
        }

        Ok(touched)
    }

    /// §4.7 step 8: delete every file under a source project's root once
    /// its source root holds nothing but its own (now-empty) barrel.
    fn maybe_remove_empty_project(&self, tree: &mut Tree, cache: &ScanCache, project_name: &str, root: &FileRef, barrel: Option<&FileRef>) {
        let files = tree.list_recursive(root);
        let has_any_source = files.iter().any(|f| {
            Some(f) != barrel && f.extension().map(is_source_extension).unwrap_or(false)
        });

        if !has_any_source {
            for file in &files {
                tree.delete(file);
                cache.invalidate(file, Some(project_name));
            }
            tracing::info!(project = project_name, root = %root, "removed emptied project");
        }
    }
}

/// Resolve a relative specifier written in `from_dir` to the [`FileRef`] it
/// names, reattaching the elided TS/JS extension if needed. Used only to
/// find the moved file's own sibling imports; it does not need to
/// handle bare/alias specifiers.
fn resolve_relative(from_dir: &FileRef, specifier: &str) -> FileRef {
    let mut segments: Vec<String> = from_dir
        .as_str()
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    for part in specifier.split('/') {
        match part {
            "." | "" => continue,
            ".." => {
                segments.pop();
            }
            other => segments.push(other.to_string()),
        }
    }

    FileRef::new_unchecked(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MoveRequest, Project, ProjectKind};

    fn projects() -> ProjectTable {
        let mut projects = ProjectTable::new();
        projects.insert(Project {
            name: "a".into(),
            root: FileRef::new_unchecked("libs/a"),
            source_root: FileRef::new_unchecked("libs/a/src"),
            alias: Some("@w/a".into()),
            barrel: Some(FileRef::new_unchecked("libs/a/src/index.ts")),
            kind: ProjectKind::Library,
        });
        projects.insert(Project {
            name: "b".into(),
            root: FileRef::new_unchecked("libs/b"),
            source_root: FileRef::new_unchecked("libs/b/src"),
            alias: Some("@w/b".into()),
            barrel: Some(FileRef::new_unchecked("libs/b/src/index.ts")),
            kind: ProjectKind::Library,
        });
        projects.insert(Project {
            name: "c".into(),
            root: FileRef::new_unchecked("libs/c"),
            source_root: FileRef::new_unchecked("libs/c/src"),
            alias: Some("@w/c".into()),
            barrel: None,
            kind: ProjectKind::Application,
        });
        projects
    }

    /// End-to-end scenario: cross-project move
    /// with an alias consumer in a third project.
    #[test]
    fn s1_cross_project_move_with_alias_consumer() {
        let mut tree = Tree::in_memory();
        tree.write(
            FileRef::new_unchecked("libs/a/src/lib/util.ts"),
            b"export function util(){return 1;}".to_vec(),
        );
        tree.write(
            FileRef::new_unchecked("libs/a/src/index.ts"),
            b"export * from './lib/util';\n".to_vec(),
        );
        tree.write(FileRef::new_unchecked("libs/b/src/index.ts"), b"".to_vec());
        tree.write(
            FileRef::new_unchecked("libs/c/src/lib/consumer.ts"),
            b"import { util } from '@w/a';\n".to_vec(),
        );

        let projects = projects();
        let aliases = AliasTable::new();
        let cache = ScanCache::new();
        let engine = MoveEngine::new(&projects, &aliases, EngineConfig::default());

        let request = MoveRequest {
            patterns: "libs/a/src/lib/util.ts".into(),
            project: "b".into(),
            ..Default::default()
        };
        let report = engine.execute(&mut tree, &cache, &request).unwrap();
        assert_eq!(report.moves.len(), 1);

        assert!(!tree.exists(&FileRef::new_unchecked("libs/a/src/lib/util.ts")));
        assert!(tree.exists(&FileRef::new_unchecked("libs/b/src/lib/util.ts")));

        let a_barrel = String::from_utf8(tree.read(&FileRef::new_unchecked("libs/a/src/index.ts")).unwrap()).unwrap();
        assert!(!a_barrel.contains("./lib/util"));

        let b_barrel = String::from_utf8(tree.read(&FileRef::new_unchecked("libs/b/src/index.ts")).unwrap()).unwrap();
        assert!(b_barrel.contains("export * from './lib/util';"));

        let consumer = String::from_utf8(
            tree.read(&FileRef::new_unchecked("libs/c/src/lib/consumer.ts")).unwrap(),
        )
        .unwrap();
        assert!(consumer.contains("from '@w/b'"));
    }

    /// S2: same-project move updates a sibling's relative import.
    #[test]
    fn s2_same_project_move_rewrites_sibling_relative_import() {
        let mut tree = Tree::in_memory();
        tree.write(
            FileRef::new_unchecked("libs/x/src/lib/a.ts"),
            b"export const a = 1;".to_vec(),
        );
        tree.write(
            FileRef::new_unchecked("libs/x/src/lib/b.ts"),
            b"import { a } from './a';\n".to_vec(),
        );

        let mut projects = ProjectTable::new();
        projects.insert(Project {
            name: "x".into(),
            root: FileRef::new_unchecked("libs/x"),
            source_root: FileRef::new_unchecked("libs/x/src"),
            alias: Some("@w/x".into()),
            barrel: None,
            kind: ProjectKind::Library,
        });
        let aliases = AliasTable::new();
        let cache = ScanCache::new();
        let engine = MoveEngine::new(&projects, &aliases, EngineConfig::default());

        let request = MoveRequest {
            patterns: "libs/x/src/lib/a.ts".into(),
            project: "x".into(),
            project_directory: Some("lib/sub".into()),
            ..Default::default()
        };
        engine.execute(&mut tree, &cache, &request).unwrap();

        assert!(tree.exists(&FileRef::new_unchecked("libs/x/src/lib/sub/a.ts")));
        let b = String::from_utf8(tree.read(&FileRef::new_unchecked("libs/x/src/lib/b.ts")).unwrap()).unwrap();
        assert!(b.contains("from './sub/a'"));
    }

    /// S4: dynamic import, require, and static import forms all rewrite.
    #[test]
    fn s4_dynamic_and_require_forms_all_rewrite() {
        let mut tree = Tree::in_memory();
        tree.write(FileRef::new_unchecked("libs/x/src/lib/u.ts"), b"export const u = 1;".to_vec());
        tree.write(
            FileRef::new_unchecked("libs/x/src/lib/consumer.ts"),
            br#"import('./u');
require('./u');
import { u } from './u';
"#
            .to_vec(),
        );

        let mut projects = ProjectTable::new();
        projects.insert(Project {
            name: "x".into(),
            root: FileRef::new_unchecked("libs/x"),
            source_root: FileRef::new_unchecked("libs/x/src"),
            alias: None,
            barrel: None,
            kind: ProjectKind::Library,
        });
        let aliases = AliasTable::new();
        let cache = ScanCache::new();
        let engine = MoveEngine::new(&projects, &aliases, EngineConfig::default());

        let request = MoveRequest {
            patterns: "libs/x/src/lib/u.ts".into(),
            project: "x".into(),
            project_directory: Some("lib/sub".into()),
            ..Default::default()
        };
        engine.execute(&mut tree, &cache, &request).unwrap();

        let consumer = String::from_utf8(
            tree.read(&FileRef::new_unchecked("libs/x/src/lib/consumer.ts")).unwrap(),
        )
        .unwrap();
        assert!(consumer.contains("import('./sub/u')"));
        assert!(consumer.contains("require('./sub/u')"));
        assert!(consumer.contains("from './sub/u'"));
    }

    /// S3: the moved file's own relative import, which used to reach a
    /// sibling in its origin project, is rewritten to the origin's alias
    /// once the move crosses a project boundary.
    #[test]
    fn s3_moved_file_own_import_promoted_to_origin_alias() {
        let mut tree = Tree::in_memory();
        tree.write(
            FileRef::new_unchecked("libs/a/src/lib/helper.ts"),
            b"export function helper(){}".to_vec(),
        );
        tree.write(
            FileRef::new_unchecked("libs/a/src/lib/a.ts"),
            b"import { helper } from './helper';\n".to_vec(),
        );
        tree.write(
            FileRef::new_unchecked("libs/a/src/index.ts"),
            b"export * from './lib/helper';\n".to_vec(),
        );
        tree.write(FileRef::new_unchecked("libs/b/src/index.ts"), b"".to_vec());

        let projects = projects();
        let aliases = AliasTable::new();
        let cache = ScanCache::new();
        let engine = MoveEngine::new(&projects, &aliases, EngineConfig::default());

        let request = MoveRequest {
            patterns: "libs/a/src/lib/a.ts".into(),
            project: "b".into(),
            ..Default::default()
        };
        engine.execute(&mut tree, &cache, &request).unwrap();

        let moved = String::from_utf8(tree.read(&FileRef::new_unchecked("libs/b/src/lib/a.ts")).unwrap()).unwrap();
        assert!(moved.contains("from '@w/a'"));
    }

    /// §8/S3 "otherwise" branch: when the moved file's sibling import is not
    /// re-exported by the origin's barrel, a bare origin-alias import would
    /// dangle, so the moved file keeps a relative path back into the origin
    /// project instead of gaining a `@w/a` import.
    #[test]
    fn moved_file_own_import_falls_back_to_relative_when_sibling_not_exported() {
        let mut tree = Tree::in_memory();
        tree.write(
            FileRef::new_unchecked("libs/a/src/lib/internal_helper.ts"),
            b"export function internalHelper(){}".to_vec(),
        );
        tree.write(
            FileRef::new_unchecked("libs/a/src/lib/a.ts"),
            b"import { internalHelper } from './internal_helper';\n".to_vec(),
        );
        // The barrel re-exports nothing from `lib/internal_helper`, so it is
        // not reachable through `@w/a`.
        tree.write(FileRef::new_unchecked("libs/a/src/index.ts"), b"".to_vec());
        tree.write(FileRef::new_unchecked("libs/b/src/index.ts"), b"".to_vec());

        let projects = projects();
        let aliases = AliasTable::new();
        let cache = ScanCache::new();
        let engine = MoveEngine::new(&projects, &aliases, EngineConfig::default());

        let request = MoveRequest {
            patterns: "libs/a/src/lib/a.ts".into(),
            project: "b".into(),
            ..Default::default()
        };
        engine.execute(&mut tree, &cache, &request).unwrap();

        let moved = String::from_utf8(tree.read(&FileRef::new_unchecked("libs/b/src/lib/a.ts")).unwrap()).unwrap();
        assert!(!moved.contains("@w/a"), "should not dangle on an unexported alias: {moved}");
        assert!(moved.contains("from '../../../a/src/lib/internal_helper'"));
    }

    /// §3 "no self-alias imports": a consumer that already lives in the
    /// target project and imports the source project's alias must end up
    /// with a relative specifier after the move, never a `@w/b` import
    /// pointing at a file inside project `b` itself.
    #[test]
    fn alias_consumer_already_in_target_project_gets_relative_not_self_alias() {
        let mut tree = Tree::in_memory();
        tree.write(
            FileRef::new_unchecked("libs/a/src/lib/util.ts"),
            b"export function util(){return 1;}".to_vec(),
        );
        tree.write(
            FileRef::new_unchecked("libs/a/src/index.ts"),
            b"export * from './lib/util';\n".to_vec(),
        );
        tree.write(FileRef::new_unchecked("libs/b/src/index.ts"), b"".to_vec());
        // This consumer lives inside the target project `b` but currently
        // reaches `util` through project `a`'s alias.
        tree.write(
            FileRef::new_unchecked("libs/b/src/lib/consumer.ts"),
            b"import { util } from '@w/a';\n".to_vec(),
        );

        let projects = projects();
        let aliases = AliasTable::new();
        let cache = ScanCache::new();
        let engine = MoveEngine::new(&projects, &aliases, EngineConfig::default());

        let request = MoveRequest {
            patterns: "libs/a/src/lib/util.ts".into(),
            project: "b".into(),
            ..Default::default()
        };
        engine.execute(&mut tree, &cache, &request).unwrap();

        let consumer = String::from_utf8(
            tree.read(&FileRef::new_unchecked("libs/b/src/lib/consumer.ts")).unwrap(),
        )
        .unwrap();
        assert!(!consumer.contains("@w/b"), "must not self-alias-import: {consumer}");
        assert!(consumer.contains("from './util'"));
    }

    /// S6: a glob batch with no target collisions lands every export in the
    /// target barrel in sorted FileRef order, one entry each.
    #[test]
    fn s6_glob_batch_lands_sorted_barrel_entries_with_no_duplicates() {
        let mut tree = Tree::in_memory();
        for name in ["api-a", "api-b", "svc-a", "svc-b", "svc-c"] {
            tree.write(
                FileRef::new_unchecked(format!("libs/a/src/lib/{name}.ts")),
                format!("export const {name} = 1;").into_bytes(),
            );
        }
        let mut barrel = String::new();
        for name in ["api-a", "api-b", "svc-a", "svc-b", "svc-c"] {
            barrel.push_str(&format!("export * from './lib/{name}';\n"));
        }
        tree.write(FileRef::new_unchecked("libs/a/src/index.ts"), barrel.into_bytes());
        tree.write(FileRef::new_unchecked("libs/b/src/index.ts"), b"".to_vec());

        let projects = projects();
        let aliases = AliasTable::new();
        let cache = ScanCache::new();
        let engine = MoveEngine::new(&projects, &aliases, EngineConfig::default());

        let request = MoveRequest {
            patterns: "libs/a/src/lib/api-*.ts,libs/a/src/lib/svc-*.ts".into(),
            project: "b".into(),
            ..Default::default()
        };
        let report = engine.execute(&mut tree, &cache, &request).unwrap();
        assert_eq!(report.moves.len(), 5);

        let b_barrel = String::from_utf8(tree.read(&FileRef::new_unchecked("libs/b/src/index.ts")).unwrap()).unwrap();
        let lines: Vec<&str> = b_barrel.lines().collect();
        assert_eq!(lines.len(), 5, "no duplicate exports: {b_barrel}");
        let names: Vec<&str> = ["api-a", "api-b", "svc-a", "svc-b", "svc-c"].to_vec();
        let mut expected_sorted = names.clone();
        expected_sorted.sort();
        for (line, name) in lines.iter().zip(expected_sorted.iter()) {
            assert!(line.contains(&format!("./lib/{name}")), "{line} should reference {name}");
        }
    }

    /// S5: re-running the same move against an already-moved workspace
    /// returns `SourceNotFound` and stages nothing.
    #[test]
    fn s5_rerun_after_move_is_source_not_found() {
        let mut tree = Tree::in_memory();
        tree.write(FileRef::new_unchecked("libs/a/src/lib/util.ts"), b"".to_vec());
        tree.write(FileRef::new_unchecked("libs/b/src/index.ts"), b"".to_vec());

        let projects = projects();
        let aliases = AliasTable::new();
        let cache = ScanCache::new();
        let engine = MoveEngine::new(&projects, &aliases, EngineConfig::default());

        let request = MoveRequest {
            patterns: "libs/a/src/lib/util.ts".into(),
            project: "b".into(),
            ..Default::default()
        };
        engine.execute(&mut tree, &cache, &request).unwrap();

        let err = engine.execute(&mut tree, &cache, &request).unwrap_err();
        assert!(matches!(err, EngineError::SourceNotFound { .. }));
    }

    #[test]
    fn remove_empty_project_deletes_root_once_drained() {
        let mut tree = Tree::in_memory();
        tree.write(FileRef::new_unchecked("libs/a/src/lib/util.ts"), b"".to_vec());
        tree.write(FileRef::new_unchecked("libs/b/src/index.ts"), b"".to_vec());

        let projects = projects();
        let aliases = AliasTable::new();
        let cache = ScanCache::new();
        let engine = MoveEngine::new(&projects, &aliases, EngineConfig::default());

        let request = MoveRequest {
            patterns: "libs/a/src/lib/util.ts".into(),
            project: "b".into(),
            remove_empty_project: true,
            ..Default::default()
        };
        engine.execute(&mut tree, &cache, &request).unwrap();

        assert!(tree.list_recursive(&FileRef::new_unchecked("libs/a")).is_empty());
    }
}
