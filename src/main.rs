//! Sealed Embed - seal files into blobs and read them back.
//!
//! Seals a directory tree into `.enc` blobs and lists, reads or extracts a
//! sealed tree with its key.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use rand::RngCore;
use sealed_embed::config::KEY_SIZES;
use sealed_embed::crypto::{seal_tree, BlobCipher};
use sealed_embed::store::{BlobStore, DirStore};
use sealed_embed::sync::{list_recursive, SyncEngine, SyncOutcome};
use sealed_embed::vfs::{normalize, EncryptedFs};
use sealed_embed::SyncConfig;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sealed-embed")]
#[command(
    author,
    version,
    about = "Read-only file system over AES-GCM sealed blobs",
    long_about = "Seals files into per-file AES-GCM blobs and reads, lists or extracts them with transparent decryption."
)]
struct Cli {
    /// Hex-encoded key file (16, 24 or 32 bytes)
    #[arg(long, global = true, default_value = "key.hex")]
    key: PathBuf,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seal every file under a directory into an output tree
    Seal {
        /// Directory with plaintext files
        src: PathBuf,

        /// Output directory for the sealed tree
        out: PathBuf,

        /// Key size in bytes when a new key file is generated
        #[arg(long, default_value = "32")]
        key_size: usize,
    },

    /// List a directory of the sealed tree
    Ls {
        /// Directory containing the sealed tree
        store: PathBuf,

        /// Virtual path to list (default: .)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Print a decrypted file
    Cat {
        /// Directory containing the sealed tree
        store: PathBuf,

        /// Virtual path to read
        path: String,
    },

    /// List every path under a virtual path, recursively
    Tree {
        /// Directory containing the sealed tree
        store: PathBuf,

        /// Virtual path to start from (default: .)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Extract files that are newer than their destination copy
    Xcopy {
        /// Directory containing the sealed tree
        store: PathBuf,

        /// Virtual source path
        src: String,

        /// Destination root
        root: PathBuf,

        /// Target directory under the root
        #[arg(default_value = "")]
        trg: String,

        /// Print the mapping as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract files, keeping or overwriting existing copies
    Unload {
        /// Directory containing the sealed tree
        store: PathBuf,

        /// Virtual source path
        src: String,

        /// Destination root
        root: PathBuf,

        /// Target directory under the root
        #[arg(default_value = "")]
        trg: String,

        /// Never overwrite an existing file
        #[arg(long)]
        keep: bool,

        /// Print the mapping as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Seal { src, out, key_size } => cmd_seal(&cli.key, &src, &out, key_size),

        Commands::Ls { store, path } => cmd_ls(&open_fs(&cli.key, &store)?, &path),

        Commands::Cat { store, path } => cmd_cat(&open_fs(&cli.key, &store)?, &path),

        Commands::Tree { store, path } => {
            for path in list_recursive(&open_fs(&cli.key, &store)?, &path) {
                println!("{}", path);
            }
            Ok(())
        }

        Commands::Xcopy {
            store,
            src,
            root,
            trg,
            json,
        } => {
            let fs = open_fs(&cli.key, &store)?;
            let engine = SyncEngine::new(SyncConfig::default())?;
            print_outcome(engine.xcopy(&fs, &src, &root, &trg), json)
        }

        Commands::Unload {
            store,
            src,
            root,
            trg,
            keep,
            json,
        } => {
            let fs = open_fs(&cli.key, &store)?;
            let engine = SyncEngine::new(SyncConfig::default())?;
            print_outcome(engine.unload(&fs, &src, &root, &trg, keep), json)
        }
    }
}

fn read_key(path: &Path) -> anyhow::Result<Vec<u8>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading key file {}", path.display()))?;
    hex::decode(text.trim()).with_context(|| format!("decoding key file {}", path.display()))
}

fn open_fs(key_path: &Path, store: &Path) -> anyhow::Result<EncryptedFs<DirStore>> {
    let key = zeroize::Zeroizing::new(read_key(key_path)?);
    Ok(EncryptedFs::new(DirStore::new(store)?, &key)?)
}

fn cmd_seal(key_path: &Path, src: &Path, out: &Path, key_size: usize) -> anyhow::Result<()> {
    let key = if key_path.exists() {
        read_key(key_path)?
    } else {
        if !KEY_SIZES.contains(&key_size) {
            bail!("key size must be one of {:?} bytes, got {}", KEY_SIZES, key_size);
        }
        let mut key = vec![0u8; key_size];
        rand::rngs::OsRng.fill_bytes(&mut key);
        std::fs::write(key_path, hex::encode(&key))
            .with_context(|| format!("writing key file {}", key_path.display()))?;
        info!("Generated new {}-byte key in {}", key_size, key_path.display());
        key
    };
    let key = zeroize::Zeroizing::new(key);

    let cipher = BlobCipher::new(&key)?;
    let written = seal_tree(src, out, &cipher)?;
    println!("Sealed {} files into {}", written.len(), out.display());
    Ok(())
}

fn cmd_ls(fs: &EncryptedFs<DirStore>, path: &str) -> anyhow::Result<()> {
    let entries = fs.read_dir(&normalize(path))?;

    if entries.is_empty() {
        println!("(empty)");
    } else {
        for entry in entries {
            println!("{}", entry);
        }
    }

    Ok(())
}

fn cmd_cat(fs: &EncryptedFs<DirStore>, path: &str) -> anyhow::Result<()> {
    let data = zeroize::Zeroizing::new(fs.read_file(&normalize(path))?);
    io::stdout().write_all(&data)?;
    Ok(())
}

fn print_outcome(outcome: SyncOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", outcome.report);
        println!(
            "{} written, {} entries mapped",
            outcome.written.len(),
            outcome.mapping.len()
        );
    }

    match outcome.error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
