//! Extraction of a store onto the real file system.
//!
//! Two policies share one walk: a timestamp-incremental copy (`xcopy`) and a
//! keep-or-overwrite copy (`unload_embed`). Neither locks the destination;
//! concurrent runs into the same tree race.

mod engine;
mod target;

pub use engine::{unload_embed, xcopy, SyncEngine, SyncOutcome, SyncPolicy};
pub use target::Target;

use crate::store::BlobStore;

/// Every path under `src`, recursively; see [`glob_star`](crate::vfs::glob_star).
pub fn list_recursive<S>(store: &S, src: &str) -> Vec<String>
where
    S: BlobStore + ?Sized,
{
    crate::vfs::glob_star(store, &crate::vfs::normalize(src))
}
