//! Two-pass detection of whether a file references any of a set of candidate
//! specifiers: a cheap substring pre-filter, then a structural confirmation
//! via [`crate::ast::parse_references`].
//!
//! The pre-filter is only ever used to rule files *out*: a candidate that is
//! not a substring of the file's raw text cannot appear as a specifier
//! literal, so skipping the parse is sound. A candidate that *is* a substring
//! still has to survive the structural pass: e.g. it might only occur inside
//! a comment or a string that isn't actually an import source.

use crate::ast::parse_references;
use crate::model::{is_source_extension, FileRef};
use crate::path_resolver::strip_elidable_extension;
use crate::tree::{ScanCache, Tree};

/// True iff `candidate` and `actual` name the same specifier, tolerating a
/// trailing elidable extension (`.ts`/`.tsx`/`.js`/`.jsx`) on either side: a
/// candidate is always built extension-less (§3), but the author may have
/// written the reference with an explicit extension (§3: "unless the source
/// explicitly wrote one").
fn specifier_matches(candidate: &str, actual: &str) -> bool {
    candidate == actual || strip_elidable_extension(candidate) == strip_elidable_extension(actual)
}

/// True iff `file` contains a static or dynamic reference to any specifier in
/// `candidates`. Parse failures are logged at debug and treated as "no
/// match", never fatal, never surfaced as an [`crate::error::EngineError`].
pub fn file_references(tree: &Tree, cache: &ScanCache, file: &FileRef, candidates: &[String]) -> bool {
    let Some(ext) = file.extension() else {
        return false;
    };
    if !is_source_extension(ext) {
        return false;
    }

    let Some(bytes) = cache.content(tree, file) else {
        return false;
    };
    let Ok(text) = std::str::from_utf8(&bytes) else {
        return false;
    };

    let mut live: Vec<&str> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if cache.is_known_negative(file, candidate) {
            continue;
        }
        if text.contains(candidate.as_str()) {
            live.push(candidate.as_str());
        } else {
            cache.mark_negative(file, candidate);
        }
    }

    if live.is_empty() {
        return false;
    }

    match parse_references(text, ext) {
        Some(refs) => {
            let found = refs
                .iter()
                .any(|r| live.iter().any(|c| specifier_matches(c, r.specifier.as_str())));
            if !found {
                for candidate in &live {
                    cache.mark_negative(file, candidate);
                }
            }
            found
        }
        None => {
            tracing::debug!(file = %file, "parse error during structural scan, treating as no match");
            false
        }
    }
}

/// Scan every file under `roots` for a reference to any of `candidates`,
/// returning the matching files in sorted order. Runs on a thread-pool scoped
/// to the caller's stack when `parallel` is set, mirroring the corpus's
/// `JoinSet`-based reference detector but without an async executor; the
/// core scan surface here is entirely synchronous (§5.1).
pub fn find_referencing_files(
    tree: &Tree,
    cache: &ScanCache,
    roots: &[FileRef],
    candidates: &[String],
    parallel: bool,
) -> Vec<FileRef> {
    let mut files: Vec<FileRef> = Vec::new();
    for root in roots {
        files.extend(tree.list_recursive(root));
    }
    files.sort();
    files.dedup();

    let mut matches: Vec<FileRef> = if parallel && files.len() > 1 {
        std::thread::scope(|scope| {
            let chunk_count = files.len().min(std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1));
            let chunk_size = files.len().div_ceil(chunk_count.max(1));
            let handles: Vec<_> = files
                .chunks(chunk_size.max(1))
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .filter(|f| file_references(tree, cache, f, candidates))
                            .cloned()
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles.into_iter().flat_map(|h| h.join().unwrap_or_default()).collect()
        })
    } else {
        files
            .iter()
            .filter(|f| file_references(tree, cache, f, candidates))
            .cloned()
            .collect()
    };

    matches.sort();
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cheap_pass_rules_out_files_without_any_candidate_substring() {
        let mut tree = Tree::in_memory();
        let f = FileRef::new_unchecked("a.ts");
        tree.write(f.clone(), b"export const a = 1;".to_vec());
        let cache = ScanCache::new();
        assert!(!file_references(&tree, &cache, &f, &["./helper".to_string()]));
        assert!(cache.is_known_negative(&f, "./helper"));
    }

    #[test]
    fn structural_pass_confirms_real_import() {
        let mut tree = Tree::in_memory();
        let f = FileRef::new_unchecked("a.ts");
        tree.write(f.clone(), b"import { x } from './helper';".to_vec());
        let cache = ScanCache::new();
        assert!(file_references(&tree, &cache, &f, &["./helper".to_string()]));
    }

    #[test]
    fn structural_pass_matches_an_explicit_elidable_extension() {
        let mut tree = Tree::in_memory();
        let f = FileRef::new_unchecked("a.ts");
        tree.write(f.clone(), b"import { x } from './helper.ts';".to_vec());
        let cache = ScanCache::new();
        assert!(file_references(&tree, &cache, &f, &["./helper".to_string()]));
    }

    #[test]
    fn substring_inside_comment_is_not_a_structural_match() {
        let mut tree = Tree::in_memory();
        let f = FileRef::new_unchecked("a.ts");
        tree.write(f.clone(), b"// see ./helper for details\nexport const a = 1;".to_vec());
        let cache = ScanCache::new();
        assert!(!file_references(&tree, &cache, &f, &["./helper".to_string()]));
    }

    #[test]
    fn find_referencing_files_is_sorted_and_deduped() {
        let mut tree = Tree::in_memory();
        tree.write(FileRef::new_unchecked("a/x.ts"), b"import './helper';".to_vec());
        tree.write(FileRef::new_unchecked("a/y.ts"), b"export const y = 1;".to_vec());
        tree.write(FileRef::new_unchecked("a/z.ts"), b"import './helper';".to_vec());
        let cache = ScanCache::new();
        let found = find_referencing_files(
            &tree,
            &cache,
            &[FileRef::new_unchecked("a")],
            &["./helper".to_string()],
            false,
        );
        assert_eq!(
            found,
            vec![FileRef::new_unchecked("a/x.ts"), FileRef::new_unchecked("a/z.ts")]
        );
    }
}
