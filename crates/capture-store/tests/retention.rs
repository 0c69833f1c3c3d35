use std::fs;
use std::path::Path;

use shotter_capture_store::{
    CaptureFile, CaptureFormat, CaptureStore, RetentionPolicy, STAGING_FILE_NAME,
};
use tempfile::tempdir;

fn touch(dir: &Path, name: &str) {
    fs::write(dir.join(name), b"x").unwrap();
}

fn names(dir: &Path) -> Vec<String> {
    let mut out: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    out.sort();
    out
}

#[test]
fn keeps_newest_per_stream() {
    let dir = tempdir().unwrap();
    for name in ["10_a.png", "20_a.png", "30_a.png"] {
        touch(dir.path(), name);
    }
    let store = CaptureStore::new(dir.path(), RetentionPolicy::new(2).unwrap());
    let report = store.sweep().unwrap();

    assert_eq!(report.removed, vec![CaptureFile::new(10, "a", CaptureFormat::Png)]);
    assert_eq!(names(dir.path()), vec!["20_a.png", "30_a.png"]);
}

#[test]
fn streams_and_formats_are_independent() {
    let dir = tempdir().unwrap();
    for name in [
        "1_a.png", "2_a.png", "3_a.png", "1_a.bmp", "5_b.png", "6_b.png", "7_b.png", "8_b.png",
        "readme.txt",
    ] {
        touch(dir.path(), name);
    }
    let store = CaptureStore::new(dir.path(), RetentionPolicy::new(2).unwrap());
    let report = store.sweep().unwrap();

    assert_eq!(report.removed_count(), 3);
    assert_eq!(
        names(dir.path()),
        vec!["1_a.bmp", "2_a.png", "3_a.png", "7_b.png", "8_b.png", "readme.txt"]
    );
}

#[test]
fn orders_by_timestamp_not_lexically() {
    let dir = tempdir().unwrap();
    for name in ["9_a.png", "10_a.png", "100_a.png"] {
        touch(dir.path(), name);
    }
    let store = CaptureStore::new(dir.path(), RetentionPolicy::new(1).unwrap());
    store.sweep().unwrap();
    assert_eq!(names(dir.path()), vec!["100_a.png"]);
}

#[test]
fn under_keep_count_is_untouched_and_idempotent() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "1_a.png");
    touch(dir.path(), "2_a.png");
    let store = CaptureStore::new(dir.path(), RetentionPolicy::new(5).unwrap());
    assert_eq!(store.sweep().unwrap().removed_count(), 0);
    assert_eq!(store.sweep().unwrap().removed_count(), 0);
    assert_eq!(names(dir.path()).len(), 2);
}

#[test]
fn staging_file_is_always_removed() {
    let dir = tempdir().unwrap();
    touch(dir.path(), STAGING_FILE_NAME);
    let store = CaptureStore::new(dir.path(), RetentionPolicy::default());
    let report = store.sweep().unwrap();
    assert!(report.staging_removed);
    assert!(!store.staging_path().exists());
    assert!(!store.sweep().unwrap().staging_removed);
}

#[test]
fn missing_directory_is_a_noop() {
    let dir = tempdir().unwrap();
    let store = CaptureStore::new(dir.path().join("absent"), RetentionPolicy::default());
    let report = store.sweep().unwrap();
    assert_eq!(report, Default::default());
    assert!(store.list(None, None).unwrap().is_empty());
}

#[test]
fn lists_newest_first_with_filters() {
    let dir = tempdir().unwrap();
    for name in ["10_a.png", "30_a.bmp", "20_b.png", "40_a.png", STAGING_FILE_NAME] {
        touch(dir.path(), name);
    }
    let store = CaptureStore::new(dir.path(), RetentionPolicy::default());

    let all: Vec<String> = store
        .list(None, None)
        .unwrap()
        .iter()
        .map(CaptureFile::file_name)
        .collect();
    assert_eq!(all, vec!["40_a.png", "30_a.bmp", "20_b.png", "10_a.png"]);

    let a_png = store.list(Some("a"), Some(CaptureFormat::Png)).unwrap();
    assert_eq!(a_png.len(), 2);
    assert_eq!(a_png[0].timestamp, 40);

    assert_eq!(store.latest("b").unwrap().unwrap().timestamp, 20);
    assert!(store.latest("c").unwrap().is_none());
}

#[test]
fn persist_then_find() {
    let dir = tempdir().unwrap();
    let store = CaptureStore::new(dir.path().join("captures"), RetentionPolicy::default());
    let file = CaptureFile::new(42, "kitchen", CaptureFormat::Png);
    let path = store.persist(&file, b"data").unwrap();

    assert_eq!(fs::read(path).unwrap(), b"data");
    assert_eq!(store.find("42_kitchen.png").unwrap(), file);
    assert!(store.find("43_kitchen.png").is_err());
    assert!(store.find("../etc/passwd").is_err());
}

#[test]
fn tmp_named_streams_are_pruned() {
    let dir = tempdir().unwrap();
    for ts in [10, 20, 30, 40] {
        touch(dir.path(), &format!("{ts}_tmp_outdoor.png"));
    }
    touch(dir.path(), STAGING_FILE_NAME);
    let store = CaptureStore::new(dir.path(), RetentionPolicy::new(2).unwrap());
    let report = store.sweep().unwrap();

    assert!(report.staging_removed);
    assert_eq!(report.removed_count(), 2);
    assert_eq!(names(dir.path()), vec!["30_tmp_outdoor.png", "40_tmp_outdoor.png"]);
    assert_eq!(store.list(Some("tmp_outdoor"), None).unwrap().len(), 2);
}

#[test]
fn zero_padded_timestamps_are_foreign() {
    let dir = tempdir().unwrap();
    for name in ["007_a.png", "8_a.png", "9_a.png"] {
        touch(dir.path(), name);
    }
    let store = CaptureStore::new(dir.path(), RetentionPolicy::new(1).unwrap());
    let report = store.sweep().unwrap();

    assert_eq!(report.removed, vec![CaptureFile::new(8, "a", CaptureFormat::Png)]);
    assert_eq!(names(dir.path()), vec!["007_a.png", "9_a.png"]);
}
