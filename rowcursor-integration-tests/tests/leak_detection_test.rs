//! Leak tracking through the process-wide detector.
//!
//! Tests in this binary share the global detector, so every assertion looks
//! only at the cursors the test itself opened.

use std::convert::Infallible;
use std::time::Duration;

use rowcursor::{global_leak_detector, CursorBuilder, CursorConfig, ResourceName, RowIndex};
use rowcursor_memory::VecRowSource;
use rowcursor_testing::TrackedResource;

fn tracked(label: &str) -> CursorConfig {
    CursorConfig::default()
        .with_label(label)
        .with_leak_tracking(true)
}

fn identity(row: u32, _: RowIndex) -> Result<u32, Infallible> {
    Ok(row)
}

#[test]
fn exhausted_cursor_deregisters() {
    let mut cursor = CursorBuilder::new(VecRowSource::new([1, 2]))
        .config(tracked("exhausted"))
        .build(identity);
    let id = cursor.id();
    assert!(global_leak_detector().is_open(id));

    while cursor.has_next().unwrap() {
        cursor.take_next().unwrap();
    }

    assert!(!global_leak_detector().is_open(id));
}

#[test]
fn dropped_cursor_deregisters() {
    let cursor = CursorBuilder::new(VecRowSource::new([1]))
        .config(tracked("dropped"))
        .build(identity);
    let id = cursor.id();

    drop(cursor);

    assert!(!global_leak_detector().is_open(id));
}

#[test]
fn untracked_cursor_is_never_registered() {
    let cursor = CursorBuilder::new(VecRowSource::new([1]))
        .config(CursorConfig::default().with_leak_tracking(false))
        .build(identity);

    assert!(!global_leak_detector().is_open(cursor.id()));
}

#[test]
fn shutdown_report_names_cursors_still_open() {
    let connection = TrackedResource::new("connection");
    let tracker = connection.tracker();
    let mut cursor = CursorBuilder::new(VecRowSource::new([1, 2, 3]))
        .resource(ResourceName::try_new("connection").unwrap(), connection)
        .config(tracked("nightly-export"))
        .build(identity);
    cursor.take_next().unwrap();

    let reports = global_leak_detector().report_open_cursors();
    let report = reports
        .iter()
        .find(|report| report.cursor_id == cursor.id())
        .expect("open cursor should be reported");

    assert_eq!(report.label.as_deref(), Some("nightly-export"));
    assert!(report.location.contains("leak_detection_test.rs"));
    assert_eq!(tracker.count(), 0);

    cursor.close();
    assert!(global_leak_detector()
        .report_open_cursors()
        .iter()
        .all(|report| report.cursor_id != cursor.id()));
    assert!(tracker.released_once());
}

#[test]
fn stats_count_open_cursors_by_label() {
    let label = "stats-by-label";
    let mut first = CursorBuilder::new(VecRowSource::new([1]))
        .config(tracked(label))
        .build(identity);
    let mut second = CursorBuilder::new(VecRowSource::new([2]))
        .config(tracked(label))
        .build(identity);

    let stats = global_leak_detector().stats();
    assert!(stats.total_open >= 2);
    assert_eq!(stats.by_label.get(label), Some(&2));

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["by_label"][label], 2);

    first.close();
    second.close();
    assert_eq!(global_leak_detector().stats().by_label.get(label), None);
}

#[test]
fn long_open_cursor_is_a_potential_leak() {
    let mut cursor = CursorBuilder::new(VecRowSource::new([1]))
        .config(tracked("slow-consumer"))
        .build(identity);

    std::thread::sleep(Duration::from_millis(20));

    assert!(global_leak_detector()
        .find_potential_leaks(Duration::from_millis(5))
        .contains(&cursor.id()));

    cursor.close();
    assert!(!global_leak_detector()
        .find_potential_leaks(Duration::ZERO)
        .contains(&cursor.id()));
}
