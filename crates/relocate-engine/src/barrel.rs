//! Barrel (`index.ts`) export management.
//!
//! Barrels are simple, line-oriented re-export files in practice: one
//! `export * from '...'` or `export { ... } from '...'` per module, so this
//! module works at the line level with a pair of regexes rather than
//! reaching for the full AST pass in [`crate::ast`]. That mirrors the
//! corpus's own `re_export_regex` idiom in its reference detector, which
//! resolves barrel exports the same lightweight way.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static EXPORT_STAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^[ \t]*export\s*\*\s*from\s*['"]([^'"]+)['"]\s*;?[ \t]*\r?\n?"#).unwrap());

static EXPORT_NAMED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^[ \t]*export\s*\{[^}]*\}\s*from\s*['"]([^'"]+)['"]\s*;?[ \t]*\r?\n?"#).unwrap());

const ELIDED_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx"];

fn strip_elided_extension(path: &str) -> &str {
    for ext in ELIDED_EXTENSIONS {
        if let Some(stripped) = path.strip_suffix(ext) {
            return stripped;
        }
    }
    path
}

fn specifier_matches(specifier: &str, rel_path: &str) -> bool {
    strip_elided_extension(specifier) == strip_elided_extension(rel_path)
}

/// True iff `content` already re-exports `rel_path`, ignoring a trailing
/// elidable extension on either side.
pub fn has_export(content: &str, rel_path: &str) -> bool {
    EXPORT_STAR_RE
        .captures_iter(content)
        .chain(EXPORT_NAMED_RE.captures_iter(content))
        .any(|c| specifier_matches(&c[1], rel_path))
}

/// Idempotently append a wildcard re-export of `rel_path`. Returns the new
/// content and whether it actually changed.
pub fn add_export(content: &str, rel_path: &str) -> (String, bool) {
    if has_export(content, rel_path) {
        return (content.to_string(), false);
    }
    let mut new_content = content.to_string();
    if !new_content.is_empty() && !new_content.ends_with('\n') {
        new_content.push('\n');
    }
    new_content.push_str(&format!("export * from '{}';\n", rel_path));
    (new_content, true)
}

/// Remove every export line (wildcard or named) that resolves to `rel_path`.
/// A barrel left with no exports is left as an empty file, never deleted.
pub fn remove_export(content: &str, rel_path: &str) -> (String, bool) {
    let mut changed = false;
    let mut result = content.to_string();

    for re in [&*EXPORT_STAR_RE, &*EXPORT_NAMED_RE] {
        loop {
            let hit = re
                .captures(&result)
                .filter(|c| specifier_matches(&c[1], rel_path))
                .map(|c| c.get(0).unwrap().range());
            let Some(range) = hit else { break };
            result.replace_range(range, "");
            changed = true;
        }
    }

    (result, changed)
}

/// Rewrite an existing export's specifier in place (same-project moves,
/// where the barrel keeps exporting the module but from a new relative
/// path). Leaves any export for a different module untouched.
pub fn rewrite_export_path(content: &str, old_rel_path: &str, new_rel_path: &str) -> (String, bool) {
    let mut changed = false;
    let mut result = content.to_string();

    for re in [&*EXPORT_STAR_RE, &*EXPORT_NAMED_RE] {
        result = re
            .replace_all(&result, |caps: &Captures| {
                let whole = caps.get(0).unwrap().as_str();
                if specifier_matches(&caps[1], old_rel_path) {
                    changed = true;
                    whole.replacen(&caps[1], new_rel_path, 1)
                } else {
                    whole.to_string()
                }
            })
            .into_owned();
    }

    (result, changed)
}
