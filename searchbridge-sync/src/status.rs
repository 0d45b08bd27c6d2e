use searchbridge_types::DomainType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Provisioning state of one eligible type, for diagnostics and admin pages.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Status {
    pub domain_type: DomainType,
    pub index_started: bool,
    pub river_started: bool,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Status [ domain_type={}, index={}, river={} ]",
            self.domain_type, self.index_started, self.river_started
        )
    }
}
