use std::collections::HashSet;

/// The control action a BlacklistStatus requests when a matched status code
/// is observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlacklistAction {
    Stop,
    Wait { seconds: u64 },
}

/// Post-response flow-control policy: reacts to blacklisted status codes
/// with a stop or wait action. Immutable during a run.
#[derive(Debug, Clone)]
pub struct BlacklistStatus {
    codes: HashSet<u16>,
    action: BlacklistAction,
}

impl BlacklistStatus {
    pub fn new(codes: impl IntoIterator<Item = u16>, action: BlacklistAction) -> Self {
        BlacklistStatus { codes: codes.into_iter().collect(), action }
    }

    pub fn is_blacklisted(&self, status: u16) -> bool {
        self.codes.contains(&status)
    }

    pub fn action(&self) -> BlacklistAction {
        self.action
    }
}
