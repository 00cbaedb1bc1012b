//! Segment catalog tests: naming, ordering, and tolerance of foreign files.

mod common;

use chrono::Duration;

use common::{t, tmp_dir, write_segment};
use videostore::error::VideoStoreError;
use videostore::storage::catalog::{list_segments, parse_segment_stamp, segment_file_name};

fn ten_secs() -> Duration {
    Duration::seconds(10)
}

#[test]
fn test_segment_file_name_round_trips_through_parser() {
    let name = segment_file_name(t(42), "mp4");
    assert_eq!(name, "2026-03-01_12-00-42.mp4");
    assert_eq!(parse_segment_stamp("2026-03-01_12-00-42"), Some(t(42)));
}

#[test]
fn test_parse_unix_stamp() {
    let expected = t(0);
    let stamp = expected.timestamp().to_string();
    assert_eq!(parse_segment_stamp(&stamp), Some(expected));
    assert_eq!(parse_segment_stamp(""), None);
    assert_eq!(parse_segment_stamp("2026-03-01 12:00:00"), None);
}

#[test]
fn test_list_is_sorted_ascending() {
    let dir = tmp_dir();
    for secs in [20, 0, 40, 10, 30] {
        write_segment(dir.path(), secs);
    }

    let segments = list_segments(dir.path(), ten_secs(), "mp4").expect("list");
    let starts: Vec<_> = segments.iter().map(|s| s.start).collect();
    assert_eq!(starts, vec![t(0), t(10), t(20), t(30), t(40)]);
    assert!(segments.windows(2).all(|w| w[0].start < w[1].start));
    assert_eq!(segments[2].end(), t(30));
}

#[test]
fn test_foreign_files_are_skipped() {
    let dir = tmp_dir();
    write_segment(dir.path(), 0);
    write_segment(dir.path(), 10);
    std::fs::write(dir.path().join("notes.txt"), "x").expect("write");
    std::fs::write(dir.path().join("garbage.mp4"), "x").expect("write");
    std::fs::write(dir.path().join("2026-03-01_12-00-20.mkv"), "x").expect("write");
    std::fs::write(dir.path().join(".2026-03-01_12-00-30.mp4"), "x").expect("write");
    std::fs::create_dir(dir.path().join("2026-03-01_12-00-40.mp4")).expect("mkdir");

    let segments = list_segments(dir.path(), ten_secs(), "mp4").expect("list");
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].start, t(0));
    assert_eq!(segments[1].start, t(10));
}

#[test]
fn test_configured_extension_is_honoured() {
    let dir = tmp_dir();
    std::fs::write(dir.path().join(segment_file_name(t(0), "ts")), "x").expect("write");
    write_segment(dir.path(), 10);

    let segments = list_segments(dir.path(), ten_secs(), "ts").expect("list");
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].start, t(0));
}

#[test]
fn test_duplicate_start_times_collapse() {
    let dir = tmp_dir();
    let calendar = write_segment(dir.path(), 0);
    let unix = dir.path().join(format!("{}.mp4", t(0).timestamp()));
    std::fs::write(&unix, "dup").expect("write");
    write_segment(dir.path(), 10);

    let segments = list_segments(dir.path(), ten_secs(), "mp4").expect("list");
    assert_eq!(segments.len(), 2);
    // Ties keep the path that sorts first.
    let kept = if calendar < unix { &calendar } else { &unix };
    assert_eq!(&segments[0].path, kept);
}

#[test]
fn test_empty_directory_lists_nothing() {
    let dir = tmp_dir();
    let segments = list_segments(dir.path(), ten_secs(), "mp4").expect("list");
    assert!(segments.is_empty());
}

#[test]
fn test_missing_directory_is_storage_read_error() {
    let dir = tmp_dir();
    let missing = dir.path().join("nope");
    let err = list_segments(&missing, ten_secs(), "mp4").unwrap_err();
    match err {
        VideoStoreError::StorageRead { path, .. } => assert_eq!(path, missing),
        other => panic!("expected StorageRead, got {other:?}"),
    }
}

#[test]
fn test_stamp_whose_end_is_unrepresentable_is_skipped() {
    let dir = tmp_dir();
    write_segment(dir.path(), 0);
    // Parses (last second chrono can represent) but start + duration overflows.
    std::fs::write(dir.path().join("8210266876799.mp4"), "x").expect("write");
    assert!(parse_segment_stamp("8210266876799").is_some());

    let segments = list_segments(dir.path(), ten_secs(), "mp4").expect("list");
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].start, t(0));
    assert_eq!(segments[0].end(), t(10));
}
