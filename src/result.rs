use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;

/// A value in a Result's custom map. Requesters and scanners both write
/// into this (e.g. the SubdomainRequester's resolved IP).
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum CustomValue {
    Text(String),
    List(Vec<String>),
}

impl std::fmt::Display for CustomValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CustomValue::Text(s) => write!(f, "{s}"),
            CustomValue::List(items) => write!(f, "found {} match(s)", items.len()),
        }
    }
}

/// One observed response, plus the fields derived from it. Immutable after
/// construction: the index is assigned exactly once, at dispatch time, by
/// the Fuzzer's per-run counter.
#[derive(Debug, Clone, Serialize)]
pub struct FuzzResult {
    pub index: u64,
    pub url: String,
    pub method: String,
    pub status: u16,
    pub length: usize,
    pub rtt: f64,
    pub words: usize,
    pub lines: usize,
    pub payload: String,
    pub custom: HashMap<String, CustomValue>,
}

impl FuzzResult {
    pub fn new(
        index: u64,
        url: String,
        method: String,
        status: u16,
        body: &str,
        rtt: Duration,
        payload: String,
    ) -> Self {
        FuzzResult {
            index,
            url,
            method,
            status,
            length: body.len(),
            rtt: rtt.as_secs_f64(),
            words: word_count(body),
            lines: line_count(body),
            payload,
            custom: HashMap::new(),
        }
    }

    pub fn with_custom(mut self, custom: HashMap<String, CustomValue>) -> Self {
        self.custom.extend(custom);
        self
    }

    /// Human length as (value, unit), largest unit with value >= 1.
    pub fn human_length(&self) -> (f64, &'static str) {
        human_length(self.length)
    }
}

/// A recoverable failure observed while fuzzing. Shares the monotonic index
/// space with FuzzResult so that progress accounting stays consistent.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub index: u64,
    pub payload: String,
    pub message: String,
}

impl ErrorRecord {
    pub fn new(index: u64, payload: String, message: String) -> Self {
        ErrorRecord { index, payload, message }
    }
}

fn word_count(body: &str) -> usize {
    body.split_whitespace().count()
}

fn line_count(body: &str) -> usize {
    if body.is_empty() {
        0
    } else {
        body.matches('\n').count() + 1
    }
}

pub fn human_length(bytes: usize) -> (f64, &'static str) {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit_idx = 0;
    while value >= 1024.0 && unit_idx < UNITS.len() - 1 {
        value /= 1024.0;
        unit_idx += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    (rounded, UNITS[unit_idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_and_line_counts() {
        let body = "hello world\nfoo bar baz";
        assert_eq!(word_count(body), 5);
        assert_eq!(line_count(body), 2);
    }

    #[test]
    fn empty_body_has_zero_lines() {
        assert_eq!(line_count(""), 0);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn human_length_picks_largest_unit() {
        assert_eq!(human_length(512), (512.0, "B"));
        assert_eq!(human_length(2048), (2.0, "KB"));
        let (value, unit) = human_length(1536);
        assert_eq!(unit, "KB");
        assert!((value - 1.5).abs() < 1e-9);
    }

    #[test]
    fn result_carries_reserved_index() {
        let r = FuzzResult::new(
            7,
            "http://t/a".into(),
            "GET".into(),
            200,
            "ok",
            Duration::from_millis(10),
            "a".into(),
        );
        assert_eq!(r.index, 7);
        assert_eq!(r.length, 2);
    }
}
