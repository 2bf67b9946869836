use std::path::{Path, PathBuf};

use resflow::fs::mock::MockFileSystem;
use resflow::fs::{FileSystem, RealFileSystem};
use resflow_test_utils::tree::TempTree;

/// Same sequence of operations against any backend.
fn exercise(fs: &dyn FileSystem, base: &Path) {
    let file = base.join("a/b/c.txt");
    fs.write(&file, b"hello").unwrap();
    assert!(fs.is_file(&file));
    assert!(fs.is_dir(&base.join("a/b")));
    assert_eq!(fs.read(&file).unwrap(), b"hello");

    let copy = base.join("x/y.txt");
    fs.copy(&file, &copy).unwrap();
    assert_eq!(fs.read(&copy).unwrap(), b"hello");

    let renamed = base.join("x/z.txt");
    fs.rename(&copy, &renamed).unwrap();
    assert!(!fs.exists(&copy));
    assert!(fs.exists(&renamed));

    let mut listed: Vec<PathBuf> = fs.read_dir(&base.join("x")).unwrap();
    listed.sort();
    assert_eq!(listed, vec![renamed.clone()]);

    fs.create_dir_all(&base.join("a/b")).unwrap();
    fs.remove_file(&renamed).unwrap();
    assert!(!fs.exists(&renamed));
    assert!(fs.remove_file(&renamed).is_err());
    assert!(fs.read(&base.join("nope.txt")).is_err());
}

#[test]
fn mock_filesystem_behaves_like_a_filesystem() {
    let fs = MockFileSystem::new();
    exercise(&fs, Path::new("root"));
}

#[test]
fn real_filesystem_behaves_like_a_filesystem() {
    let tree = TempTree::new();
    exercise(&RealFileSystem, tree.root());
}

#[test]
fn mock_modification_times_advance_on_write() {
    let fs = MockFileSystem::new();
    fs.add_file("a.txt", "1");
    let first = fs.modified(Path::new("a.txt")).unwrap();
    fs.write(Path::new("a.txt"), b"2").unwrap();
    let second = fs.modified(Path::new("a.txt")).unwrap();
    assert!(second > first);

    fs.set_modified("a.txt", 42);
    assert_eq!(fs.modified(Path::new("a.txt")).unwrap(), 42);
}

#[test]
fn real_modification_time_is_positive() {
    let tree = TempTree::new();
    let path = tree.write("a.txt", "x");
    assert!(RealFileSystem.modified(&path).unwrap() > 0);
}
