use std::sync::Arc;

use crate::error::FuzzError;
use crate::result::{CustomValue, FuzzResult};

/// Per-mode logic that inspects and formats Results. `inspect_result` may
/// augment `result.custom`; `scan` is scanner-local accept/reject, AND-ed
/// with the Matcher's verdict by the Fuzzer; `cli_callback` renders the
/// one-line CLI output for a matched result.
///
/// Default scanners accept everything and leave custom untouched: the
/// Fuzzer has already merged the requester's custom map (e.g. the
/// SubdomainRequester's resolved IP) into the Result before the scanner
/// ever runs, so SubdomainScanner's inspect_result is a true no-op.
pub trait Scanner: Send + Sync {
    fn inspect_result(&self, _result: &mut FuzzResult) {}

    fn scan(&self, _result: &FuzzResult) -> bool {
        true
    }

    fn cli_callback(&self, result: &FuzzResult) -> String;
}

fn default_cli_line(result: &FuzzResult) -> String {
    let (length, unit) = result.human_length();
    format!(
        "{:<30} {:>10.4}s {:>7.2}{unit:>3} {:>6}W {:>5}L  [Status {}]",
        result.payload, result.rtt, length, result.words, result.lines, result.status
    )
}

#[derive(Debug, Default)]
pub struct PathScanner;

impl Scanner for PathScanner {
    fn cli_callback(&self, result: &FuzzResult) -> String {
        format!("{} {}", result.status, result.url)
            + &format!(" [{}W, {}C, {}L]", result.words, result.length, result.lines)
    }
}

#[derive(Debug, Default)]
pub struct MethodScanner;

impl Scanner for MethodScanner {
    fn cli_callback(&self, result: &FuzzResult) -> String {
        format!("{:<8} {} -> {}", result.method, result.url, result.status)
    }
}

#[derive(Debug, Default)]
pub struct DataScanner;

impl Scanner for DataScanner {
    fn cli_callback(&self, result: &FuzzResult) -> String {
        default_cli_line(result)
    }
}

/// inspect_result is a no-op: the requester (not the scanner) is the one
/// that resolves and attaches the IP, via the Fuzzer's custom-map merge
/// step.
#[derive(Debug, Default)]
pub struct SubdomainScanner;

impl Scanner for SubdomainScanner {
    fn cli_callback(&self, result: &FuzzResult) -> String {
        let ip = result
            .custom
            .get("ip")
            .map(CustomValue::to_string)
            .unwrap_or_else(|| "?".to_string());
        format!(
            "{} [IP {:>15} | Code {} | RTT {:.4}s | Size {}]",
            result.url,
            ip,
            result.status,
            result.rtt,
            result.length
        )
    }
}

/// Resolves a scanner by its plugin-registry name, case-insensitively.
pub fn by_name(name: &str) -> Result<Arc<dyn Scanner>, FuzzError> {
    match name.to_lowercase().as_str() {
        "path" => Ok(Arc::new(PathScanner)),
        "method" => Ok(Arc::new(MethodScanner)),
        "data" => Ok(Arc::new(DataScanner)),
        "subdomain" => Ok(Arc::new(SubdomainScanner)),
        other => Err(FuzzError::UnknownPlugin {
            name: other.to_string(),
            available: "path, method, data, subdomain".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn result() -> FuzzResult {
        FuzzResult::new(0, "http://t/a".into(), "GET".into(), 200, "ok", Duration::from_millis(5), "a".into())
    }

    #[test]
    fn default_scanners_accept_everything() {
        assert!(PathScanner.scan(&result()));
        assert!(DataScanner.scan(&result()));
        assert!(SubdomainScanner.scan(&result()));
        assert!(MethodScanner.scan(&result()));
    }

    #[test]
    fn subdomain_scanner_inspect_is_noop() {
        let mut r = result();
        r.custom.insert("ip".into(), CustomValue::Text("1.2.3.4".into()));
        SubdomainScanner.inspect_result(&mut r);
        assert_eq!(r.custom.get("ip").unwrap().to_string(), "1.2.3.4");
    }

    #[test]
    fn subdomain_cli_callback_includes_ip() {
        let mut r = result();
        r.custom.insert("ip".into(), CustomValue::Text("1.2.3.4".into()));
        let line = SubdomainScanner.cli_callback(&r);
        assert!(line.contains("1.2.3.4"));
    }

    #[test]
    fn path_cli_callback_includes_status_and_url() {
        let line = PathScanner.cli_callback(&result());
        assert!(line.contains("200"));
        assert!(line.contains("http://t/a"));
    }

    #[test]
    fn by_name_resolves_known_scanners_case_insensitively() {
        assert!(by_name("PATH").is_ok());
        assert!(by_name("subdomain").is_ok());
        assert!(by_name("bogus").is_err());
    }
}
