//! File-backed activity log

use chrono::NaiveDateTime;
use pretty_assertions::assert_eq;
use resource_scaler::{
    Sample,
    activity::{ActivityLog, FileActivityLog, Severity},
};

fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

/// Split `<timestamp> - <message>` and check the timestamp parses.
fn message_of(line: &str) -> &str {
    let (timestamp, message) = line.split_once(" - ").unwrap();
    assert_eq!(timestamp.len(), "2024-01-01 00:00:00,000".len());
    NaiveDateTime::parse_from_str(&timestamp[..19], "%Y-%m-%d %H:%M:%S").unwrap();
    message
}

#[test]
fn test_lines_are_timestamped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("resource_usage.log");

    let mut log = FileActivityLog::open(&path).unwrap().quiet();
    log.log(Severity::Info, &Sample::new(40.0, 55.0, 60.0).to_string());
    log.log(Severity::Error, "Failed to scale to GCP: boom");

    let lines = read_lines(&path);
    assert_eq!(lines.len(), 2);
    assert_eq!(message_of(&lines[0]), "CPU: 40.0%, Memory: 55.0%, Disk: 60.0%");
    assert_eq!(message_of(&lines[1]), "Failed to scale to GCP: boom");
}

#[test]
fn test_announcements_stay_out_of_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("resource_usage.log");

    let mut log = FileActivityLog::open(&path).unwrap().quiet();
    log.announce("Resource threshold exceeded! Triggering cloud scaling...");

    assert!(read_lines(&path).is_empty());
}

#[test]
fn test_reopening_appends() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("resource_usage.log");

    {
        let mut log = FileActivityLog::open(&path).unwrap().quiet();
        log.log(Severity::Info, "first run");
    }
    let mut log = FileActivityLog::open(&path).unwrap().quiet();
    assert_eq!(log.path(), path.as_path());
    log.log(Severity::Info, "second run");

    let messages: Vec<String> = read_lines(&path)
        .iter()
        .map(|line| message_of(line).to_string())
        .collect();
    assert_eq!(messages, vec!["first run", "second run"]);
}

#[test]
fn test_open_fails_for_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("resource_usage.log");
    assert!(FileActivityLog::open(path).is_err());
}
