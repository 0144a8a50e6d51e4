use std::fs;

use fanout_engine::{ensure_output_dir, AtomicFileWriter, PersistError, StagedWrite};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("out").join("nested");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("doc.json", b"hello").unwrap();
    assert_eq!(first.file_name().unwrap(), "doc.json");
    assert_eq!(fs::read(&first).unwrap(), b"hello");

    let second = writer.write("doc.json", b"world").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read(&second).unwrap(), b"world");
}

#[test]
fn no_clobber_writer_refuses_existing_file() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("doc.json"), b"keep").unwrap();

    let writer = AtomicFileWriter::new(temp.path().to_path_buf()).replace(false);
    let err = writer.write("doc.json", b"new").unwrap_err();
    assert!(matches!(err, PersistError::Exists(_)));
    assert_eq!(fs::read(temp.path().join("doc.json")).unwrap(), b"keep");
}

#[test]
fn no_partial_file_when_dir_is_a_file() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    assert!(writer.write("doc.md", b"data").is_err());
    assert!(!file_path.with_file_name("doc.md").exists());
}

#[test]
fn failed_commit_rolls_back_earlier_files() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("b.txt"), b"existing").unwrap();

    let mut staged = StagedWrite::new(temp.path()).unwrap();
    staged.stage("a.txt", b"a").unwrap();
    staged.stage("b.txt", b"b").unwrap();
    staged.stage("c.txt", b"c").unwrap();
    assert_eq!(staged.len(), 3);

    let err = staged.commit(false).unwrap_err();
    assert!(matches!(err, PersistError::Exists(ref p) if p.ends_with("b.txt")));
    assert!(!temp.path().join("a.txt").exists());
    assert!(!temp.path().join("c.txt").exists());
    assert_eq!(fs::read(temp.path().join("b.txt")).unwrap(), b"existing");
    // Only the pre-existing file remains; temporaries are gone.
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}
