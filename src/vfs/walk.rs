//! Pre-order traversal and recursive listing.

use crate::error::{Error, Result};
use crate::store::BlobStore;
use crate::vfs::path::join;
use crate::vfs::types::FileInfo;
use std::convert::Infallible;
use tracing::debug;

/// What the walker does after a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    /// Keep going, descending into the entry if it is a directory.
    Continue,
    /// Do not descend into this directory. Same as `Continue` for files.
    SkipDir,
}

/// Walk the tree rooted at `root` depth-first, visiting each directory
/// before its children and children in [`BlobStore::names`] order.
///
/// Every path is stat'ed and passed to `visit` as `Ok(info)`, or as `Err`
/// when the stat fails. A directory whose listing fails is visited a second
/// time with that error. Returning `Err` from `visit` stops the walk and
/// hands the error back to the caller; a visitor that wants the usual
/// stop-on-first-error behavior simply does `let info = entry?;`.
pub fn walk_dir<S, F>(store: &S, root: &str, visit: F) -> Result<()>
where
    S: BlobStore + ?Sized,
    F: FnMut(&str, Result<FileInfo>) -> Result<WalkControl>,
{
    try_walk::<S, F, Error>(store, root, visit)
}

/// [`walk_dir`] with the visitor's own error type. A visitor returning
/// `Result<_, Infallible>` walks the whole tree.
pub(crate) fn try_walk<S, F, E>(store: &S, root: &str, mut visit: F) -> Result<(), E>
where
    S: BlobStore + ?Sized,
    F: FnMut(&str, Result<FileInfo>) -> Result<WalkControl, E>,
{
    match store.stat(root) {
        Ok(info) => walk_entry(store, root, info, &mut visit),
        Err(e) => visit(root, Err(e)).map(|_| ()),
    }
}

fn walk_entry<S, F, E>(store: &S, path: &str, info: FileInfo, visit: &mut F) -> Result<(), E>
where
    S: BlobStore + ?Sized,
    F: FnMut(&str, Result<FileInfo>) -> Result<WalkControl, E>,
{
    let is_dir = info.is_dir;
    if visit(path, Ok(info))? == WalkControl::SkipDir || !is_dir {
        return Ok(());
    }

    let names = match store.names(path) {
        Ok(names) => names,
        Err(e) => {
            visit(path, Err(e))?;
            return Ok(());
        }
    };

    for name in names {
        let child = join(path, &name);
        match store.stat(&child) {
            Ok(child_info) => walk_entry(store, &child, child_info, visit)?,
            Err(e) => {
                visit(&child, Err(e))?;
            }
        }
    }

    Ok(())
}

/// Every path under `root`, directories and files, in walk order.
///
/// Like `root/**` with globstar: fully recursive, root included. Paths that
/// cannot be opened are left out instead of failing the listing.
pub fn glob_star<S>(store: &S, root: &str) -> Vec<String>
where
    S: BlobStore + ?Sized,
{
    let mut paths = Vec::new();
    let walked = try_walk(store, root, |path, entry| -> Result<_, Infallible> {
        match entry {
            Ok(_) => paths.push(path.to_string()),
            Err(e) => debug!("Skipping {}: {}", path, e),
        }
        Ok(WalkControl::Continue)
    });
    match walked {
        Ok(()) => paths,
        Err(never) => match never {},
    }
}
