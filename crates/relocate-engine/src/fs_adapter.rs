//! Async adapter that flushes a [`Tree`]'s staged overlay to a real
//! directory on disk.
//!
//! This is the only place in the crate that performs actual filesystem
//! I/O; the engine, planner, scanner, and rewriter all operate purely over
//! the in-memory overlay (§9 design note: "the engine never touches the
//! real filesystem directly"). A caller typically builds a [`Tree`] with
//! [`Tree::from_dir`], hands it to [`crate::engine::MoveEngine`], and calls
//! [`flush`] once the engine returns successfully.

use crate::tree::Tree;
use relocate_foundation::{FoundationError, FoundationResult};
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Write every staged mutation in `tree` to `root`: present files are
/// written (creating parent directories as needed), deleted files are
/// removed if they still exist on disk. A directory left empty by deletions
/// is not pruned; only the engine's `removeEmptyProject` path ever removes
/// a directory, and it does so by staging deletes for every file under it.
pub async fn flush(tree: &Tree, root: &Path) -> FoundationResult<()> {
    let staged: Vec<_> = tree.staged().map(|(f, present)| (f.clone(), present)).collect();

    for (file, present) in staged {
        let abs = root.join(file.as_str());
        if present {
            if let Some(parent) = abs.parent() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| FoundationError::io(parent.to_path_buf(), e))?;
            }
            let bytes = tree
                .read(&file)
                .expect("a staged-present entry always has readable bytes");
            fs::write(&abs, &bytes)
                .await
                .map_err(|e| FoundationError::io(abs.clone(), e))?;
            debug!(path = %file, "flushed file to disk");
        } else if fs::try_exists(&abs).await.unwrap_or(false) {
            fs::remove_file(&abs)
                .await
                .map_err(|e| FoundationError::io(abs.clone(), e))?;
            debug!(path = %file, "removed file from disk");
        }
    }

    Ok(())
}
