// tests/cache_recovery.rs
//
// A damaged or foreign cache file means a cold start: nothing is deleted,
// and the next save replaces it with a valid file.

use std::sync::Arc;

use resflow::cache::{OutputCache, PathSet, FORMAT_VERSION};
use resflow::engine::CancelFlag;
use resflow::fs::mock::MockFileSystem;
use resflow::fs::FileSystem;
use resflow::project::RunScope;
use resflow::types::CaseSensitivity;
use resflow_test_utils::builders::{driver, project, UnitBuilder};
use resflow_test_utils::init_tracing;

const CACHE: &str = ".resflow/outputs.bin";

fn valid_cache_bytes(fs: &Arc<dyn FileSystem>) -> Vec<u8> {
    let mut cache = OutputCache::new(fs.clone(), CACHE, CaseSensitivity::Sensitive);
    cache.snapshot(
        "app",
        PathSet::from_paths(CaseSensitivity::Sensitive, ["out/old.txt"]),
    );
    cache.save().unwrap();
    fs.read(std::path::Path::new(CACHE)).unwrap()
}

fn run_after_corruption(corrupt: impl FnOnce(Vec<u8>) -> Vec<u8>) {
    init_tracing();
    let mem = MockFileSystem::new();
    let fs: Arc<dyn FileSystem> = Arc::new(mem.clone());

    let bytes = valid_cache_bytes(&fs);
    mem.add_file(CACHE, corrupt(bytes));
    mem.add_file("out/old.txt", "old");
    mem.add_file("res/new.txt", "new");

    let project = project(
        ".",
        vec![UnitBuilder::new("app").output("out").copy_root("res").build()],
    );

    let mut drv = driver(fs.clone(), CACHE, CaseSensitivity::Sensitive);
    assert!(drv.cache().is_empty(), "damaged cache must load empty");

    let report = drv
        .run(&project, &RunScope::All, &CancelFlag::new())
        .unwrap();

    assert!(!report.has_errors());
    assert!(report.deleted.is_empty());
    assert!(mem.content("out/old.txt").is_some(), "cold start must not delete");
    assert_eq!(mem.content("out/new.txt").unwrap(), b"new");

    let reloaded = OutputCache::load(fs, CACHE, CaseSensitivity::Sensitive);
    assert!(reloaded.get("app").unwrap().contains("out/new.txt"));
}

#[test]
fn truncated_cache_is_a_cold_start() {
    run_after_corruption(|mut bytes| {
        bytes.truncate(bytes.len() / 2);
        bytes
    });
}

#[test]
fn foreign_version_is_a_cold_start() {
    run_after_corruption(|mut bytes| {
        bytes[..4].copy_from_slice(&(FORMAT_VERSION + 1).to_be_bytes());
        bytes
    });
}

#[test]
fn flipped_byte_is_a_cold_start() {
    run_after_corruption(|mut bytes| {
        let mid = bytes.len() / 3;
        bytes[mid] ^= 0x5a;
        bytes
    });
}

#[test]
fn empty_file_is_a_cold_start() {
    run_after_corruption(|_| Vec::new());
}

#[test]
fn unreadable_cache_is_a_cold_start() {
    init_tracing();
    let mem = MockFileSystem::new();
    let fs: Arc<dyn FileSystem> = Arc::new(mem.clone());
    valid_cache_bytes(&fs);
    mem.make_unreadable(CACHE);

    let cache = OutputCache::load(fs, CACHE, CaseSensitivity::Sensitive);
    assert!(cache.is_empty());
}
