//! Integration tests: structured log emission and validation.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use segbin_core::{BucketConfig, Tier};
use segbin_harness::structured_log::{
    LogEmitter, LogEntry, LogLevel, Outcome, validate_log_file, validate_log_line,
};

fn unique_tmp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time should be after UNIX_EPOCH")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("segbin-log-{}-{nanos}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir.join(name)
}

#[test]
fn emitter_file_validates_clean() {
    let path = unique_tmp_path("run.jsonl");
    let mut emitter = LogEmitter::to_file(&path, "segbin", "test-run").expect("open log");

    emitter.emit(LogLevel::Info, "lookup_start").expect("emit");
    let entry = emitter
        .entry(LogLevel::Info, "lookup_resolved")
        .with_command("lookup")
        .with_scheme("word64", BucketConfig::WORD64)
        .with_operation("index_of")
        .with_size(700)
        .with_index(46)
        .with_tier(Tier::Log)
        .with_outcome(Outcome::Pass);
    emitter.emit_entry(entry).expect("emit");
    let entry = emitter
        .entry(LogLevel::Warn, "lookup_resolved")
        .with_command("lookup")
        .with_size(8)
        .with_error("size 8 is below the minimum chunk size 24");
    emitter.emit_entry(entry).expect("emit");
    emitter.flush().expect("flush");
    drop(emitter);

    let (lines, errors) = validate_log_file(&path).expect("read log");
    assert_eq!(lines, 3);
    assert!(errors.is_empty(), "{errors:?}");

    let content = std::fs::read_to_string(&path).expect("read log");
    let traces: Vec<String> = content
        .lines()
        .map(|l| validate_log_line(l, 0).expect("valid line").trace_id)
        .collect();
    assert_eq!(
        traces,
        [
            "segbin::test-run::001",
            "segbin::test-run::002",
            "segbin::test-run::003"
        ]
    );

    let last = validate_log_line(content.lines().last().unwrap(), 3).unwrap();
    assert_eq!(last.outcome, Some(Outcome::Error));
}

#[test]
fn failed_entry_without_error_is_rejected() {
    let line = LogEntry::new("segbin::r::001", LogLevel::Error, "check")
        .with_outcome(Outcome::Fail)
        .to_jsonl()
        .expect("serialize");
    let errors = validate_log_line(&line, 7).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "error");
    assert!(errors[0].to_string().starts_with("line 7:"));
}

#[test]
fn bad_trace_and_command_are_rejected() {
    let line = LogEntry::new("segbin-001", LogLevel::Info, "x")
        .with_command("explode")
        .to_jsonl()
        .expect("serialize");
    let errors = validate_log_line(&line, 1).unwrap_err();
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert!(fields.contains(&"trace_id"));
    assert!(fields.contains(&"command"));
}

#[test]
fn missing_required_fields_are_listed() {
    let errors = validate_log_line(r#"{"level":"info"}"#, 1).unwrap_err();
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, ["timestamp", "trace_id", "event"]);
}
