use url::Url;

use crate::error::FuzzError;

pub const DEFAULT_MARKER: &str = "$";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuzzingMode {
    Path,
    Subdomain,
    Method,
    Data,
}

/// A concrete request ready to be sent, produced by `Injector::inject`.
#[derive(Debug, Clone)]
pub struct ConcreteRequest {
    pub url: String,
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// The parsed, still-marked request template. Built once from the CLI and
/// immutable thereafter.
#[derive(Debug, Clone)]
pub struct Target {
    pub url_template: String,
    pub method_template: String,
    pub header_templates: Vec<(String, String)>,
    pub body_template: Option<String>,
    pub marker: String,
}

impl Target {
    pub fn new(url_template: impl Into<String>) -> Self {
        Target {
            url_template: url_template.into(),
            method_template: "GET".to_string(),
            header_templates: Vec::new(),
            body_template: None,
            marker: DEFAULT_MARKER.to_string(),
        }
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method_template = method.into();
        self
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.header_templates = headers;
        self
    }

    pub fn with_body(mut self, body: Option<String>) -> Self {
        self.body_template = body;
        self
    }

    fn contains_marker(&self, s: &str) -> bool {
        s.contains(self.marker.as_str())
    }

    /// Detects the fuzzing mode from marker position.
    ///
    /// Precedence: method position first, then the URL authority
    /// (subdomain), then header/body values (data), then the rest of the
    /// URL (path/query). The injector does not validate that a marker
    /// claimed to sit in the authority actually forms a syntactically valid
    /// subdomain boundary — a malformed URL can silently fall back to path
    /// mode. This is intentional; see SPEC_FULL.md open questions.
    pub fn detect_mode(&self) -> FuzzingMode {
        if self.contains_marker(&self.method_template) {
            return FuzzingMode::Method;
        }
        if url_authority_contains_marker(&self.url_template, &self.marker) {
            return FuzzingMode::Subdomain;
        }
        let headers_marked = self
            .header_templates
            .iter()
            .any(|(_, v)| self.contains_marker(v));
        let body_marked = self
            .body_template
            .as_deref()
            .map(|b| self.contains_marker(b))
            .unwrap_or(false);
        if headers_marked || body_marked {
            return FuzzingMode::Data;
        }
        FuzzingMode::Path
    }

    /// The URL with every marker occurrence removed, for logging/reporting.
    pub fn pure_url(&self) -> String {
        self.url_template.replace(self.marker.as_str(), "")
    }

    pub fn host(&self) -> Result<String, FuzzError> {
        let pure = self.pure_url();
        let parsed = Url::parse(&pure)?;
        Ok(parsed.host_str().unwrap_or_default().to_string())
    }

    /// Builds a Target from a raw HTTP request (request-line, CRLF- or
    /// LF-terminated header block, optional body), as read from a `-r` file.
    /// `scheme` supplies what the request line itself cannot (http vs https).
    pub fn from_raw_request(raw: &str, scheme: &str) -> Result<Target, FuzzError> {
        let mut lines = raw.split('\n').map(|l| l.trim_end_matches('\r'));

        let request_line = lines
            .next()
            .ok_or_else(|| FuzzError::Config("empty raw request file".to_string()))?;
        let mut parts = request_line.split_whitespace();
        let method = parts
            .next()
            .ok_or_else(|| FuzzError::Config("raw request missing method".to_string()))?
            .to_string();
        let path = parts
            .next()
            .ok_or_else(|| FuzzError::Config("raw request missing path".to_string()))?
            .to_string();

        let mut headers = Vec::new();
        let mut host = None;
        let mut body_lines = Vec::new();
        let mut in_body = false;
        for line in lines {
            if in_body {
                body_lines.push(line);
                continue;
            }
            if line.is_empty() {
                in_body = true;
                continue;
            }
            if let Some((name, value)) = line.split_once(':') {
                let name = name.trim().to_string();
                let value = value.trim().to_string();
                if name.eq_ignore_ascii_case("host") {
                    host = Some(value.clone());
                }
                headers.push((name, value));
            }
        }

        let host = host
            .ok_or_else(|| FuzzError::Config("raw request missing Host header".to_string()))?;
        let body = if body_lines.is_empty() {
            None
        } else {
            let joined = body_lines.join("\n");
            if joined.is_empty() { None } else { Some(joined) }
        };

        Ok(Target::new(format!("{scheme}://{host}{path}"))
            .with_method(method)
            .with_headers(headers)
            .with_body(body))
    }
}

/// True if the marker appears in the host/authority portion of the URL
/// string. We operate on the raw string (not a parsed Url) because the
/// marker usually makes the URL syntactically invalid until injected.
fn url_authority_contains_marker(url_template: &str, marker: &str) -> bool {
    let after_scheme = match url_template.find("://") {
        Some(pos) => &url_template[pos + 3..],
        None => url_template,
    };
    let authority_end = after_scheme
        .find(['/', '?', '#'])
        .unwrap_or(after_scheme.len());
    let authority = &after_scheme[..authority_end];
    authority.contains(marker)
}

/// Produces concrete requests from a Target by substituting a payload at
/// every occurrence of the marker appropriate to the detected mode.
pub struct Injector {
    target: Target,
    mode: FuzzingMode,
}

impl Injector {
    pub fn new(target: Target) -> Self {
        let mode = target.detect_mode();
        Injector { target, mode }
    }

    pub fn mode(&self) -> FuzzingMode {
        self.mode
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn inject(&self, payload: &str) -> ConcreteRequest {
        let marker = self.target.marker.as_str();
        match self.mode {
            FuzzingMode::Method => ConcreteRequest {
                url: self.target.url_template.clone(),
                method: self.target.method_template.replace(marker, payload),
                headers: self.target.header_templates.clone(),
                body: self.target.body_template.clone(),
            },
            FuzzingMode::Subdomain | FuzzingMode::Path => ConcreteRequest {
                url: self.target.url_template.replace(marker, payload),
                method: self.target.method_template.clone(),
                headers: self.target.header_templates.clone(),
                body: self.target.body_template.clone(),
            },
            FuzzingMode::Data => ConcreteRequest {
                url: self.target.url_template.replace(marker, payload),
                method: self.target.method_template.clone(),
                headers: self
                    .target
                    .header_templates
                    .iter()
                    .map(|(k, v)| (k.clone(), v.replace(marker, payload)))
                    .collect(),
                body: self
                    .target
                    .body_template
                    .as_ref()
                    .map(|b| b.replace(marker, payload)),
            },
        }
    }
}
