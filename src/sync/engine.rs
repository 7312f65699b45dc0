//! Materializing a store onto the real file system.

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::store::BlobStore;
use crate::sync::target::Target;
use crate::vfs::{try_walk, FileInfo, WalkControl};
use filetime::FileTime;
use serde::Serialize;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Decides whether an existing destination file is left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPolicy {
    /// Skip files whose destination mtime is at or after the source mtime
    /// (`xcopy /d`).
    Newer,
    /// Skip existing files when `keep` is set; otherwise skip only when the
    /// destination size equals the source size.
    ///
    /// Size is a cheap difference check: a same-size edit is not detected.
    KeepOrOverwrite { keep: bool },
}

/// Result of a sync run.
///
/// Per-entry failures do not stop the run; the first one is kept in
/// `error` and everything else that could be reached is still attempted.
#[derive(Debug, Default, Serialize)]
pub struct SyncOutcome {
    /// Path relative to the source -> destination path, for every visited entry.
    pub mapping: BTreeMap<String, PathBuf>,
    /// One `path -> destination` line per file written.
    pub report: String,
    /// Virtual paths of the files written in this run.
    pub written: Vec<String>,
    /// First error encountered.
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<Error>,
}

fn serialize_error<S: serde::Serializer>(
    error: &Option<Error>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

impl SyncOutcome {
    /// Whether every entry synced.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Split into the mapping and report, or the first error.
    pub fn into_result(self) -> Result<(BTreeMap<String, PathBuf>, String)> {
        match self.error {
            Some(e) => Err(e),
            None => Ok((self.mapping, self.report)),
        }
    }

    fn record_error(&mut self, path: &str, error: Error) {
        // NotFound and Entry already name the path
        let error = match error {
            e @ (Error::NotFound(_) | Error::Entry { .. }) => e,
            e => e.at_path(path),
        };
        warn!("Sync failed: {}", error);
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

/// What happened to one entry.
enum Action {
    Skipped,
    Created,
    Written,
}

/// Sync engine: walks a store and writes it under a destination directory.
#[derive(Debug, Clone, Default)]
pub struct SyncEngine {
    config: SyncConfig,
}

impl SyncEngine {
    /// Create an engine with a validated configuration.
    pub fn new(config: SyncConfig) -> Result<Self> {
        config.validate().map_err(Error::InvalidConfig)?;
        Ok(Self { config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Timestamp-incremental copy of `src` into `root/trg`.
    pub fn xcopy<S>(&self, store: &S, src: &str, root: &Path, trg: &str) -> SyncOutcome
    where
        S: BlobStore + ?Sized,
    {
        self.run(store, &Target::new(src, root, trg), SyncPolicy::Newer)
    }

    /// Copy of `src` into `root/trg` that keeps or overwrites existing files.
    pub fn unload<S>(&self, store: &S, src: &str, root: &Path, trg: &str, keep: bool) -> SyncOutcome
    where
        S: BlobStore + ?Sized,
    {
        self.run(
            store,
            &Target::new(src, root, trg),
            SyncPolicy::KeepOrOverwrite { keep },
        )
    }

    /// Walk the source and apply `policy` to every entry.
    pub fn run<S>(&self, store: &S, target: &Target, policy: SyncPolicy) -> SyncOutcome
    where
        S: BlobStore + ?Sized,
    {
        let mut outcome = SyncOutcome::default();

        let walked = try_walk(store, target.src(), |path, entry| -> Result<_, Infallible> {
            let info = match entry {
                Ok(info) => info,
                Err(e) => {
                    outcome.record_error(path, e);
                    return Ok(WalkControl::Continue);
                }
            };

            let dest = target.destination(path);
            outcome
                .mapping
                .insert(target.key(path).to_string(), dest.clone());

            let result = if info.is_dir {
                self.sync_dir(&dest)
            } else {
                self.sync_file(store, path, &info, &dest, policy)
            };

            match result {
                Ok(Action::Written) => {
                    info!("{} -> {}", path, dest.display());
                    outcome
                        .report
                        .push_str(&format!("{} -> {}\n", path, dest.display()));
                    outcome.written.push(path.to_string());
                }
                Ok(Action::Created) => debug!("Created directory {}", dest.display()),
                Ok(Action::Skipped) => debug!("Up to date: {}", dest.display()),
                Err(e) => {
                    outcome.record_error(path, e);
                    if info.is_dir {
                        return Ok(WalkControl::SkipDir);
                    }
                }
            }
            Ok(WalkControl::Continue)
        });

        match walked {
            Ok(()) => outcome,
            Err(never) => match never {},
        }
    }

    /// Create a destination directory unless it exists.
    fn sync_dir(&self, dest: &Path) -> Result<Action> {
        match fs::metadata(dest) {
            Ok(meta) if meta.is_dir() => Ok(Action::Skipped),
            Ok(_) => Err(Error::NotADirectory(dest.display().to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                create_dir_all(dest, self.config.dir_mode)?;
                Ok(Action::Created)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn sync_file<S>(
        &self,
        store: &S,
        path: &str,
        info: &FileInfo,
        dest: &Path,
        policy: SyncPolicy,
    ) -> Result<Action>
    where
        S: BlobStore + ?Sized,
    {
        match fs::metadata(dest) {
            Ok(existing) => {
                let up_to_date = match policy {
                    SyncPolicy::Newer => existing.modified()? >= info.modified,
                    SyncPolicy::KeepOrOverwrite { keep } => keep || existing.len() == info.size,
                };
                if up_to_date {
                    return Ok(Action::Skipped);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        self.write_file(store, path, info, dest)?;
        Ok(Action::Written)
    }

    /// Write the decrypted content, verify the size on disk and stamp the
    /// original mtime.
    fn write_file<S>(&self, store: &S, path: &str, info: &FileInfo, dest: &Path) -> Result<()>
    where
        S: BlobStore + ?Sized,
    {
        let data = Zeroizing::new(store.read_file(path)?);

        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                create_dir_all(parent, self.config.dir_mode)?;
            }
        }

        let mut file = open_for_write(dest, self.config.file_mode)?;
        file.write_all(&data)?;
        file.flush()?;
        drop(file);

        let expected = data.len() as u64;
        let actual = fs::metadata(dest)?.len();
        if actual != expected {
            return Err(Error::WriteVerification {
                path: dest.to_path_buf(),
                expected,
                actual,
            });
        }

        if self.config.preserve_mtime {
            filetime::set_file_mtime(dest, FileTime::from_system_time(info.modified))?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn create_dir_all(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(mode).create(path)
}

#[cfg(not(unix))]
fn create_dir_all(path: &Path, _mode: u32) -> io::Result<()> {
    fs::create_dir_all(path)
}

#[cfg(unix)]
fn open_for_write(path: &Path, mode: u32) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(path)
}

#[cfg(not(unix))]
fn open_for_write(path: &Path, _mode: u32) -> io::Result<fs::File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

/// Timestamp-incremental copy with the default configuration.
///
/// A file is rewritten unless the destination exists with an mtime at or
/// after the original's; written files get the original mtime.
pub fn xcopy<S>(store: &S, src: &str, root: &Path, trg: &str) -> SyncOutcome
where
    S: BlobStore + ?Sized,
{
    SyncEngine::default().xcopy(store, src, root, trg)
}

/// Keep-or-overwrite copy with the default configuration.
///
/// With `keep`, existing files always win; without it a file is rewritten
/// unless the destination already has the same size.
pub fn unload_embed<S>(store: &S, src: &str, root: &Path, trg: &str, keep: bool) -> SyncOutcome
where
    S: BlobStore + ?Sized,
{
    SyncEngine::default().unload(store, src, root, trg, keep)
}
