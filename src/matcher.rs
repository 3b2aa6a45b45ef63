use std::collections::HashSet;
use std::ops::RangeInclusive;

use crate::result::FuzzResult;

/// A status-code acceptance set: a discrete set unioned with a closed range.
#[derive(Debug, Clone)]
pub struct StatusSet {
    discrete: HashSet<u16>,
    range: Option<RangeInclusive<u16>>,
}

impl StatusSet {
    pub fn new(discrete: impl IntoIterator<Item = u16>, range: Option<RangeInclusive<u16>>) -> Self {
        StatusSet { discrete: discrete.into_iter().collect(), range }
    }

    /// Default for URL-discovery modes (path/subdomain): 200-399 plus 401, 403.
    pub fn default_url_discovery() -> Self {
        StatusSet::new([401, 403], Some(200..=399))
    }

    /// Default for other modes (method/data): 200-399 only.
    pub fn default_other() -> Self {
        StatusSet::new([], Some(200..=399))
    }

    pub fn contains(&self, status: u16) -> bool {
        self.discrete.contains(&status) || self.range.as_ref().is_some_and(|r| r.contains(&status))
    }
}

/// Boolean classifier over a Result: status-code set plus optional
/// exclusion cutoffs on body length and RTT.
///
/// The length/time thresholds are *exclusion cutoffs*, not inclusion
/// floors: a result whose body length or RTT exceeds the threshold is
/// rejected. This reads as the inverse of what the CLI help text could
/// suggest, but it is the semantics this engine has always implemented and
/// is preserved deliberately (see SPEC_FULL.md §9).
#[derive(Debug, Clone)]
pub struct Matcher {
    pub allowed_status: StatusSet,
    pub length_threshold: Option<usize>,
    pub time_threshold: Option<f64>,
}

impl Matcher {
    pub fn new(allowed_status: StatusSet) -> Self {
        Matcher { allowed_status, length_threshold: None, time_threshold: None }
    }

    pub fn with_length_threshold(mut self, threshold: usize) -> Self {
        self.length_threshold = Some(threshold);
        self
    }

    pub fn with_time_threshold(mut self, threshold: f64) -> Self {
        self.time_threshold = Some(threshold);
        self
    }

    pub fn comparator_is_set(&self) -> bool {
        self.length_threshold.is_some() || self.time_threshold.is_some()
    }

    pub fn is_match(&self, result: &FuzzResult) -> bool {
        if !self.allowed_status.contains(result.status) {
            return false;
        }
        if let Some(threshold) = self.length_threshold {
            if result.length > threshold {
                return false;
            }
        }
        if let Some(threshold) = self.time_threshold {
            if result.rtt > threshold {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn result(status: u16, body: &str, rtt_secs: f64) -> FuzzResult {
        FuzzResult::new(
            0,
            "http://t/a".into(),
            "GET".into(),
            status,
            body,
            Duration::from_secs_f64(rtt_secs),
            "a".into(),
        )
    }

    #[test]
    fn default_url_discovery_accepts_200_and_401_403() {
        let m = Matcher::new(StatusSet::default_url_discovery());
        assert!(m.is_match(&result(200, "", 0.0)));
        assert!(m.is_match(&result(401, "", 0.0)));
        assert!(m.is_match(&result(403, "", 0.0)));
        assert!(!m.is_match(&result(404, "", 0.0)));
    }

    #[test]
    fn length_threshold_is_exclusion_cutoff() {
        let m = Matcher::new(StatusSet::default_other()).with_length_threshold(10);
        assert!(m.is_match(&result(200, "short", 0.0)));
        assert!(!m.is_match(&result(200, "this body is far too long", 0.0)));
    }

    #[test]
    fn time_threshold_is_exclusion_cutoff() {
        let m = Matcher::new(StatusSet::default_other()).with_time_threshold(1.0);
        assert!(m.is_match(&result(200, "", 0.5)));
        assert!(!m.is_match(&result(200, "", 1.5)));
    }

    #[test]
    fn comparator_is_set_reflects_configuration() {
        let plain = Matcher::new(StatusSet::default_other());
        assert!(!plain.comparator_is_set());
        let with_len = plain.clone().with_length_threshold(1);
        assert!(with_len.comparator_is_set());
    }

    #[test]
    fn is_pure_function_of_result_and_config() {
        let m = Matcher::new(StatusSet::default_other());
        let r = result(200, "ok", 0.1);
        assert_eq!(m.is_match(&r), m.is_match(&r));
    }
}
