//! Identifier types used throughout the bridge.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies a class of persisted object supplied by the host application.
///
/// The value is the fully qualified, dot-separated name the host uses for the
/// type (e.g. `models.Article`). The core treats it as opaque apart from the
/// namespace helpers used by the startup eligibility filter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainType(String);

impl DomainType {
    /// Creates a domain type from a qualified name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Parses a domain type, rejecting blank names.
    pub fn parse(s: &str) -> Result<Self, crate::Error> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(crate::Error::InvalidDomainType(s.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The qualified name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Everything before the last `.`, or `None` for an unqualified name.
    pub fn namespace(&self) -> Option<&str> {
        self.0.rsplit_once('.').map(|(ns, _)| ns)
    }

    /// The last path segment.
    pub fn simple_name(&self) -> &str {
        self.0.rsplit_once('.').map_or(self.0.as_str(), |(_, name)| name)
    }

    /// Returns true if this type lives in `namespace` or one of its children.
    ///
    /// `models.Article` and `models.blog.Post` are both inside `models`;
    /// `modelsextra.Thing` is not.
    pub fn is_within(&self, namespace: &str) -> bool {
        match self.0.strip_prefix(namespace) {
            Some(rest) => rest.starts_with('.'),
            None => false,
        }
    }
}

impl fmt::Display for DomainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DomainType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<&str> for DomainType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for DomainType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
