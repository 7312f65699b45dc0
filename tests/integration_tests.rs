//! Integration tests for the sealed virtual file system.

use sealed_embed::crypto::{seal_tree, BlobCipher};
use sealed_embed::store::{BlobStore, DirStore, MemoryStore};
use sealed_embed::sync::list_recursive;
use sealed_embed::vfs::{walk_dir, EncryptedFs, WalkControl};
use sealed_embed::Error;
use std::fs;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

const KEY: [u8; 32] = *b"0123456789abcdef0123456789abcdef";

fn original_mtime() -> SystemTime {
    UNIX_EPOCH + Duration::new(1_650_000_000, 500)
}

fn gopher() -> Vec<u8> {
    (0u8..42).map(|b| b.wrapping_mul(7)).collect()
}

/// `bin/gopher.png.enc` and `hello.txt.enc`, as the build would embed them.
fn embedded_store() -> MemoryStore {
    let cipher = BlobCipher::new(&KEY).expect("Failed to create cipher");
    let mut store = MemoryStore::new();
    store.insert_dir("bin").expect("Failed to create dir");
    store
        .insert_file(
            "bin/gopher.png.enc",
            cipher.seal(&gopher(), original_mtime()).unwrap(),
            UNIX_EPOCH,
        )
        .expect("Failed to insert blob");
    store
        .insert_file(
            "hello.txt.enc",
            cipher.seal(b"Hello, World!", original_mtime()).unwrap(),
            UNIX_EPOCH,
        )
        .expect("Failed to insert blob");
    store
}

#[test]
fn test_scenario_read_stat_list() {
    let vfs = EncryptedFs::new(embedded_store(), &KEY).expect("Failed to create fs");

    assert_eq!(vfs.read_file("bin/gopher.png").unwrap(), gopher());

    let info = vfs.stat("bin/gopher.png").unwrap();
    assert_eq!(info.size, 42);
    assert_eq!(info.modified, original_mtime());

    let entries = vfs.read_dir(".").unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "bin");
    assert!(entries[0].is_dir);
    assert_eq!(entries[1].name, "hello.txt");
    assert!(!entries[1].is_dir);

    assert_eq!(
        list_recursive(&vfs, "."),
        vec![".", "bin", "bin/gopher.png", "hello.txt"]
    );
}

#[test]
fn test_listing_matches_tolerant_walk() {
    let vfs = EncryptedFs::new(embedded_store(), &KEY).unwrap();

    let mut walked = Vec::new();
    walk_dir(&vfs, ".", |path, entry| {
        if entry.is_ok() {
            walked.push(path.to_string());
        }
        Ok(WalkControl::Continue)
    })
    .unwrap();

    let listed = list_recursive(&vfs, ".");
    assert_eq!(listed, walked);

    let mut deduped = listed.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), listed.len());
}

#[test]
fn test_sealed_tree_on_disk() {
    let src = TempDir::new().expect("Failed to create temp dir");
    let sealed = TempDir::new().expect("Failed to create temp dir");
    fs::create_dir_all(src.path().join("docs/work")).unwrap();
    fs::write(src.path().join("readme.txt"), b"Root level file").unwrap();
    fs::write(src.path().join("docs/report.txt"), b"Work document content").unwrap();
    fs::write(src.path().join("docs/work/notes.txt"), b"Deep nested notes").unwrap();

    let cipher = BlobCipher::new(&KEY).unwrap();
    let written = seal_tree(src.path(), sealed.path(), &cipher).expect("Failed to seal");
    assert_eq!(written.len(), 3);
    assert!(sealed.path().join("docs/work/notes.txt.enc").is_file());

    let vfs = EncryptedFs::new(DirStore::new(sealed.path()).unwrap(), &KEY).unwrap();

    assert_eq!(vfs.read_file("readme.txt").unwrap(), b"Root level file");
    assert_eq!(
        vfs.read_file("docs/work/notes.txt").unwrap(),
        b"Deep nested notes"
    );

    let original = fs::metadata(src.path().join("docs/report.txt"))
        .unwrap()
        .modified()
        .unwrap();
    let info = vfs.stat("docs/report.txt").unwrap();
    assert_eq!(info.modified, original);
    assert_eq!(info.size, "Work document content".len() as u64);

    assert_eq!(
        list_recursive(&vfs, "docs"),
        vec!["docs", "docs/report.txt", "docs/work", "docs/work/notes.txt"]
    );
}

#[test]
fn test_wrong_key_fails_closed() {
    let vfs = EncryptedFs::new(embedded_store(), &[0x11; 32]).unwrap();

    let err = vfs.read_file("hello.txt").unwrap_err();
    assert!(matches!(err.root_cause(), Error::Decryption));

    // directories need no key
    assert!(vfs.stat("bin").unwrap().is_dir);

    // the listing skips what it cannot open instead of failing
    assert_eq!(list_recursive(&vfs, "."), vec![".", "bin"]);

    // while a strict walk stops at the first failure
    let result = walk_dir(&vfs, ".", |_, entry| entry.map(|_| WalkControl::Continue));
    assert!(matches!(
        result.unwrap_err().root_cause(),
        Error::Decryption
    ));
}

#[test]
fn test_corrupted_blob_on_disk() {
    let src = TempDir::new().unwrap();
    let sealed = TempDir::new().unwrap();
    fs::write(src.path().join("a.txt"), b"first").unwrap();
    fs::write(src.path().join("b.txt"), b"second").unwrap();

    let cipher = BlobCipher::new(&KEY).unwrap();
    seal_tree(src.path(), sealed.path(), &cipher).unwrap();

    let blob_path = sealed.path().join("a.txt.enc");
    let mut blob = fs::read(&blob_path).unwrap();
    blob[30] ^= 0x04;
    fs::write(&blob_path, blob).unwrap();

    let vfs = EncryptedFs::new(DirStore::new(sealed.path()).unwrap(), &KEY).unwrap();
    assert!(vfs.read_file("a.txt").is_err());
    assert!(vfs.read_dir(".").is_err());
    assert_eq!(vfs.read_file("b.txt").unwrap(), b"second");
    assert_eq!(list_recursive(&vfs, "."), vec![".", "b.txt"]);
}

#[test]
fn test_independent_handles() {
    use std::io::Read;

    let vfs = EncryptedFs::new(embedded_store(), &KEY).unwrap();
    let mut first = vfs.open("hello.txt").unwrap();
    let mut second = vfs.open("hello.txt").unwrap();

    let mut buf = [0u8; 5];
    first.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"Hello");

    let mut all = Vec::new();
    second.read_to_end(&mut all).unwrap();
    assert_eq!(all, b"Hello, World!");

    let mut rest = Vec::new();
    first.read_to_end(&mut rest).unwrap();
    assert_eq!(rest, b", World!");

    first.close();
    second.close();
}

#[test]
fn test_concurrent_readers_share_store() {
    let vfs = std::sync::Arc::new(EncryptedFs::new(embedded_store(), &KEY).unwrap());

    let threads: Vec<_> = (0..4)
        .map(|_| {
            let vfs = vfs.clone();
            std::thread::spawn(move || vfs.read_file("bin/gopher.png").unwrap())
        })
        .collect();

    for thread in threads {
        assert_eq!(thread.join().unwrap(), gopher());
    }
}
