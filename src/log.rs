use std::fs;
use std::fs::OpenOptions;
use std::path::PathBuf;

use chrono::Local;
use serde::Serialize;

use crate::error::{Error, Result};

/// Timestamp used for log rows and screenshot file names.
pub fn timestamp() -> String {
    Local::now().format("%Y-%m-%d_%H-%M-%S").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

/// The persisted record of one submission attempt. Written exactly once per
/// run, on both the success and the failure path.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub timestamp: String,
    pub url: String,
    pub status: RunStatus,
    pub error: String,
}

impl RunResult {
    pub fn success(timestamp: String, url: String) -> Self {
        Self {
            timestamp,
            url,
            status: RunStatus::Success,
            error: String::new(),
        }
    }

    pub fn failure(timestamp: String, url: String, error: &Error) -> Self {
        Self {
            timestamp,
            url,
            status: RunStatus::Error,
            error: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}

/// Append-only CSV run log. The header row is written when the file is
/// created; rows from later runs are appended beneath it.
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn append(&self, result: &RunResult) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let needs_header = fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(["timestamp", "url", "status", "error"])?;
        }
        writer.serialize(result)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_is_filename_safe() {
        let ts = timestamp();
        assert_eq!(ts.len(), "2026-08-04_12-00-00".len());
        assert!(ts.chars().all(|c| c.is_ascii_digit() || c == '-' || c == '_'));
    }

    #[test]
    fn header_is_written_once_and_rows_append() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("run_log.csv");
        let log = RunLog::new(&path);

        log.append(&RunResult::success("ts-1".into(), "https://a.test".into()))
            .expect("first append");
        log.append(&RunResult {
            timestamp: "ts-2".into(),
            url: "https://b.test".into(),
            status: RunStatus::Error,
            error: "Submit failed: no submit control found".into(),
        })
        .expect("second append");

        let content = fs::read_to_string(&path).expect("read log");
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "timestamp,url,status,error");
        assert!(lines[1].starts_with("ts-1,https://a.test,success,"));
        assert!(lines[2].contains("error"));
        assert!(lines[2].contains("no submit control found"));
    }

    #[test]
    fn error_detail_with_commas_stays_one_record() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("run_log.csv");
        let log = RunLog::new(&path);

        log.append(&RunResult {
            timestamp: "ts".into(),
            url: "https://a.test".into(),
            status: RunStatus::Error,
            error: "Failed to fill field 'Topics, ranked' (multi_select): timeout".into(),
        })
        .expect("append");

        let content = fs::read_to_string(&path).expect("read log");
        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let records: Vec<csv::StringRecord> =
            reader.records().map(|r| r.expect("record")).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(&records[0][3], "Failed to fill field 'Topics, ranked' (multi_select): timeout");
    }

    #[test]
    fn missing_parent_directory_is_created() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("run_log.csv");
        RunLog::new(&path)
            .append(&RunResult::success("ts".into(), "https://a.test".into()))
            .expect("append into fresh dir");
        assert!(path.exists());
    }
}
