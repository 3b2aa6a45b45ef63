use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::blacklist::{BlacklistAction, BlacklistStatus};
use crate::error::FuzzError;
use crate::matcher::StatusSet;

/// Parses `-Mc`-style status specs: comma-separated discrete codes plus at
/// most one `LO-HI` range token, bounds auto-swapped if given in reverse.
/// Mirrors the engine's original status-parsing rule exactly.
pub fn parse_status_set(spec: &str) -> Result<StatusSet, FuzzError> {
    let mut discrete = Vec::new();
    let mut range = None;

    for token in spec.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if !token.contains('-') {
            let code = token
                .parse::<u16>()
                .map_err(|_| FuzzError::Config(format!("invalid status code '{token}'")))?;
            discrete.push(code);
        } else {
            let (left, right) = token
                .split_once('-')
                .ok_or_else(|| FuzzError::Config(format!("invalid status range '{token}'")))?;
            let mut lo = left
                .trim()
                .parse::<u16>()
                .map_err(|_| FuzzError::Config(format!("invalid status range '{token}'")))?;
            let mut hi = right
                .trim()
                .parse::<u16>()
                .map_err(|_| FuzzError::Config(format!("invalid status range '{token}'")))?;
            if hi < lo {
                std::mem::swap(&mut lo, &mut hi);
            }
            range = Some(lo..=hi);
        }
    }

    Ok(StatusSet::new(discrete, range))
}

/// Parses `--blacklist-status CODES:ACTION=PARAM`, e.g. `403:stop` or
/// `429,503:wait=5`.
pub fn parse_blacklist(spec: &str) -> Result<BlacklistStatus, FuzzError> {
    let (codes_part, action_part) = spec
        .split_once(':')
        .ok_or_else(|| FuzzError::Config(format!("blacklist spec '{spec}' missing ':ACTION'")))?;

    let codes: Vec<u16> = codes_part
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u16>().map_err(|_| FuzzError::Config(format!("invalid blacklist code '{s}'"))))
        .collect::<Result<_, _>>()?;

    let action = match action_part.split_once('=') {
        Some((name, param)) if name.eq_ignore_ascii_case("wait") => {
            let seconds = param
                .parse::<u64>()
                .map_err(|_| FuzzError::Config(format!("invalid wait seconds '{param}'")))?;
            BlacklistAction::Wait { seconds }
        }
        None if action_part.eq_ignore_ascii_case("stop") => BlacklistAction::Stop,
        None if action_part.eq_ignore_ascii_case("wait") => {
            return Err(FuzzError::Config("wait action requires '=SECONDS'".to_string()))
        }
        _ => return Err(FuzzError::Config(format!("unknown blacklist action '{action_part}'"))),
    };

    Ok(BlacklistStatus::new(codes, action))
}

/// The TOML-file overlay, mirroring the teacher's config shape: every field
/// optional, CLI flags always win over file values when both are set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    pub url: Option<String>,
    pub rawfile: Option<String>,
    pub scheme: Option<String>,
    pub method: Option<String>,
    pub wordlist: Option<Vec<String>>,
    pub threads: Option<usize>,
    pub delay: Option<f64>,
    pub timeout: Option<u64>,
    pub follow_redirects: Option<bool>,
    pub match_codes: Option<String>,
    pub match_length: Option<usize>,
    pub match_time: Option<f64>,
    pub blacklist_status: Option<String>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub case_fold: Option<String>,
    pub encoders: Option<Vec<String>>,
    pub scanner: Option<String>,
    pub output: Option<String>,
    pub cookie: Option<String>,
    pub proxy: Option<String>,
    pub proxies: Option<String>,
    pub unique: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, FuzzError> {
        let text = std::fs::read_to_string(path).map_err(FuzzError::Io)?;
        toml::from_str(&text).map_err(|e| FuzzError::Config(format!("invalid config file: {e}")))
    }
}

/// Overlays a file value under a CLI value: the CLI flag wins whenever it
/// was actually supplied, matching the teacher's `matches.value_of(...).or(config...)` precedence.
pub fn overlay<T>(cli_value: Option<T>, file_value: Option<T>) -> Option<T> {
    cli_value.or(file_value)
}

/// Same precedence rule for repeatable CLI flags: a non-empty CLI list wins
/// outright (clap already accumulated every repetition), otherwise fall
/// back to the file's list.
pub fn overlay_vec<T>(cli_value: Vec<T>, file_value: Option<Vec<T>>) -> Vec<T> {
    if !cli_value.is_empty() {
        cli_value
    } else {
        file_value.unwrap_or_default()
    }
}
