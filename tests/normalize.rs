use std::fs;
use std::path::{Path, PathBuf};

use img::normalize::{normalize_all, normalize_many, Action};
use img::{normalize_file, ErrorKind, Normalized, Removal};

fn touch(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

fn names(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn copies_under_normalized_name() {
    let dir = tempfile::tempdir().unwrap();
    let original = touch(dir.path(), "Hello World.JPG", "pixels");

    let done = normalize_file(&original, Removal::Keep).unwrap();
    assert_eq!(done.action, Action::Copied);
    assert!(done.changed());
    assert_eq!(done.new_path, dir.path().join("hello-world.jpg"));
    assert_eq!(fs::read_to_string(&done.new_path).unwrap(), "pixels");
    assert!(original.exists());
}

#[test]
fn delete_removes_the_original() {
    let dir = tempfile::tempdir().unwrap();
    let original = touch(dir.path(), "--Summer   Trip--.PNG", "x");

    let done = normalize_file(&original, Removal::Delete).unwrap();
    assert_eq!(done.action, Action::Renamed);
    assert_eq!(names(dir.path()), ["summer-trip.png"]);
}

#[test]
fn canonical_name_is_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let original = touch(dir.path(), "already-fine.txt", "x");

    let done = normalize_file(&original, Removal::Delete).unwrap();
    assert_eq!(done.action, Action::Unchanged);
    assert!(!done.changed());
    assert_eq!(done.new_path, original);
    assert_eq!(names(dir.path()), ["already-fine.txt"]);
}

#[test]
fn existing_target_is_a_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let original = touch(dir.path(), "My File.txt", "new");
    let taken = touch(dir.path(), "my-file.txt", "old");

    let err = normalize_file(&original, Removal::Delete).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Conflict(ref p) if p == &taken));
    assert_eq!(fs::read_to_string(&original).unwrap(), "new");
    assert_eq!(fs::read_to_string(&taken).unwrap(), "old");
}

#[test]
fn missing_and_directory_inputs_fail() {
    let dir = tempfile::tempdir().unwrap();

    let err = normalize_file(dir.path().join("Nope.txt"), Removal::Keep).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NotFound(_)));

    let sub = dir.path().join("Sub Dir");
    fs::create_dir(&sub).unwrap();
    let err = normalize_file(&sub, Removal::Keep).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::IsDirectory(_)));
}

#[test]
fn batch_reports_failures_together() {
    let dir = tempfile::tempdir().unwrap();
    let a = touch(dir.path(), "a.TXT", "a");
    let b = touch(dir.path(), "b.TXT", "b");
    let missing = PathBuf::from("/nonexistent");

    let mut done: Vec<Normalized> = Vec::new();
    let err = normalize_many([a, missing.clone(), b], Removal::Delete, |n| {
        done.push(n.clone())
    })
    .unwrap_err();

    assert_eq!(done.len(), 2);
    assert_eq!(names(dir.path()), ["a.txt", "b.txt"]);

    let ErrorKind::Batch(batch) = &err.kind else {
        panic!("expected a batch error, got {err}");
    };
    assert_eq!(batch.failures().len(), 1);
    assert_eq!(batch.failures()[0].path, missing);
    assert!(matches!(batch.failures()[0].error.kind, ErrorKind::NotFound(_)));

    let message = err.to_string();
    assert!(message.starts_with("normalize completed with errors:\n"));
    assert!(message.contains("/nonexistent: file does not exist: /nonexistent"));
}

#[test]
fn normalize_all_skips_directories() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "B Side.MP3", "b");
    touch(dir.path(), "a  side.mp3", "a");
    touch(dir.path(), "done.txt", "d");
    fs::create_dir(dir.path().join("Keep Me")).unwrap();

    let mut seen = Vec::new();
    normalize_all(dir.path(), Removal::Delete, |n| seen.push(n.action)).unwrap();

    // Sorted by name: "B Side.MP3" < "a  side.mp3" < "done.txt".
    assert_eq!(seen, [Action::Renamed, Action::Renamed, Action::Unchanged]);
    assert_eq!(
        names(dir.path()),
        ["Keep Me", "a-side.mp3", "b-side.mp3", "done.txt"]
    );
}

// Needs a case-sensitive filesystem to hold both names.
#[cfg(target_os = "linux")]
#[test]
fn normalize_all_keeps_going_past_conflicts() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "Clash.txt", "1");
    touch(dir.path(), "clash.txt", "2");
    touch(dir.path(), "Other One.txt", "3");

    let err = normalize_all(dir.path(), Removal::Keep, |_| {}).unwrap_err();
    let ErrorKind::Batch(batch) = &err.kind else {
        panic!("expected a batch error, got {err}");
    };
    assert_eq!(batch.label(), "normalize-all");
    assert_eq!(batch.failures().len(), 1);
    assert!(matches!(batch.failures()[0].error.kind, ErrorKind::Conflict(_)));
    assert!(dir.path().join("other-one.txt").exists());
}
