use std::path::Path;

use serde::Serialize;

use crate::error::FuzzError;
use crate::result::FuzzResult;
use crate::scanner::Scanner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Txt,
    Csv,
    Json,
}

impl ReportFormat {
    pub fn from_path(path: &str) -> Result<Self, FuzzError> {
        match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some("txt") => Ok(ReportFormat::Txt),
            Some("csv") => Ok(ReportFormat::Csv),
            Some("json") => Ok(ReportFormat::Json),
            other => Err(FuzzError::Config(format!(
                "unsupported report extension '{}'",
                other.unwrap_or("<none>")
            ))),
        }
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    index: u64,
    url: &'a str,
    method: &'a str,
    status: u16,
    length: usize,
    rtt: f64,
    words: usize,
    lines: usize,
    payload: &'a str,
}

/// Writes every matched result to `path` in the format implied by its
/// extension. TXT renders one `cli_callback` line per result; CSV and JSON
/// mirror the documented `index, url, method, status, length, rtt, words,
/// lines, payload, custom` schema.
pub fn write_report(
    path: &str,
    results: &[FuzzResult],
    scanner: &dyn Scanner,
) -> Result<(), FuzzError> {
    match ReportFormat::from_path(path)? {
        ReportFormat::Txt => write_txt(path, results, scanner),
        ReportFormat::Csv => write_csv(path, results),
        ReportFormat::Json => write_json(path, results),
    }
}

fn write_txt(path: &str, results: &[FuzzResult], scanner: &dyn Scanner) -> Result<(), FuzzError> {
    let mut lines = String::new();
    for result in results {
        lines.push_str(&scanner.cli_callback(result));
        lines.push('\n');
    }
    std::fs::write(path, lines).map_err(FuzzError::Io)
}

fn write_csv(path: &str, results: &[FuzzResult]) -> Result<(), FuzzError> {
    let file = std::fs::File::create(path).map_err(FuzzError::Io)?;
    let mut writer = csv::Writer::from_writer(file);
    for result in results {
        writer
            .serialize(CsvRow {
                index: result.index,
                url: &result.url,
                method: &result.method,
                status: result.status,
                length: result.length,
                rtt: result.rtt,
                words: result.words,
                lines: result.lines,
                payload: &result.payload,
            })
            .map_err(|e| FuzzError::Config(format!("csv write failed: {e}")))?;
    }
    writer
        .flush()
        .map_err(FuzzError::Io)
}

fn write_json(path: &str, results: &[FuzzResult]) -> Result<(), FuzzError> {
    let text = serde_json::to_string_pretty(results)
        .map_err(|e| FuzzError::Config(format!("json serialize failed: {e}")))?;
    std::fs::write(path, text).map_err(FuzzError::Io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::PathScanner;
    use std::time::Duration;

    fn sample() -> Vec<FuzzResult> {
        vec![FuzzResult::new(
            0,
            "http://t/admin".into(),
            "GET".into(),
            200,
            "ok",
            Duration::from_millis(5),
            "admin".into(),
        )]
    }

    #[test]
    fn format_is_selected_by_extension() {
        assert_eq!(ReportFormat::from_path("out.json").unwrap(), ReportFormat::Json);
        assert_eq!(ReportFormat::from_path("out.csv").unwrap(), ReportFormat::Csv);
        assert_eq!(ReportFormat::from_path("out.txt").unwrap(), ReportFormat::Txt);
        assert!(ReportFormat::from_path("out.xml").is_err());
    }

    #[test]
    fn writes_json_report_with_expected_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_report(path.to_str().unwrap(), &sample(), &PathScanner).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"status\": 200"));
        assert!(text.contains("admin"));
    }

    #[test]
    fn writes_txt_report_using_scanner_callback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_report(path.to_str().unwrap(), &sample(), &PathScanner).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("200 http://t/admin"));
    }

    #[test]
    fn writes_csv_report_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_report(path.to_str().unwrap(), &sample(), &PathScanner).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("index,url,method,status"));
    }
}
