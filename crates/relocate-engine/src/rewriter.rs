//! Specifier rewriting by byte-offset splicing.
//!
//! Per §4.4 the rewriter never regenerates source via a full AST-to-text
//! codegen pass: it parses only to find the byte ranges of specifier
//! literals, then edits the original text in place, back-to-front so earlier
//! offsets stay valid. Everything outside a rewritten literal (formatting,
//! comments, unrelated code) survives byte-for-byte. This is why the
//! dependency list carries `swc_ecma_parser`/`swc_ecma_ast`/`swc_ecma_visit`
//! but not `swc_ecma_codegen`: there is no codegen step to perform.

use crate::ast::parse_references;
use crate::model::FileRef;
use crate::path_resolver::strip_elidable_extension;
use crate::tree::{ScanCache, Tree};
use std::collections::HashMap;

/// Resolve the replacement for a reference's literal `specifier` against
/// `map`, whose keys are always extension-less (§3). An exact key hit wins
/// first; otherwise, since the author may have written an explicit elidable
/// extension the map was never keyed on, strip it and retry, reattaching the
/// same extension to the replacement so the rewritten literal still matches
/// the form the author originally used.
fn resolve_replacement(map: &HashMap<String, String>, specifier: &str) -> Option<String> {
    if let Some(v) = map.get(specifier) {
        return Some(v.clone());
    }
    let stripped = strip_elidable_extension(specifier);
    if stripped == specifier {
        return None;
    }
    map.get(stripped).map(|v| format!("{v}{}", &specifier[stripped.len()..]))
}

/// Rewrite every reference in `file` whose specifier is a key in `map` (or
/// that same key with a trailing elidable extension the author wrote
/// explicitly) to the corresponding value, preserving the original quote
/// character. Returns `true` iff the file's content actually changed.
///
/// A parse failure leaves the file untouched and is logged at debug level;
/// the caller must not treat it as fatal, since a file we can't parse is a
/// file whose imports we also can't have found during scanning.
pub fn rewrite(tree: &mut Tree, cache: &ScanCache, file: &FileRef, map: &HashMap<String, String>) -> bool {
    let Some(bytes) = tree.read(file) else {
        return false;
    };
    let Ok(text) = String::from_utf8(bytes) else {
        return false;
    };
    let Some(ext) = file.extension() else {
        return false;
    };

    let Some(refs) = parse_references(&text, ext) else {
        tracing::debug!(file = %file, "parse error during rewrite, leaving file untouched");
        return false;
    };

    let mut edits: Vec<_> = refs
        .iter()
        .filter_map(|r| resolve_replacement(map, &r.specifier).map(|new_specifier| (r, new_specifier)))
        .collect();
    if edits.is_empty() {
        return false;
    }

    // Splice back-to-front so earlier byte ranges stay valid as we edit.
    edits.sort_by(|a, b| b.0.literal_range.0.cmp(&a.0.literal_range.0));

    let mut spliced = text;
    for (r, new_specifier) in &edits {
        let (lo, hi) = r.literal_range;
        let replacement = format!("{q}{s}{q}", q = r.quote, s = new_specifier);
        spliced.replace_range(lo..hi, &replacement);
    }

    tree.write(file.clone(), spliced.into_bytes());
    cache.invalidate(file, None);
    true
}
