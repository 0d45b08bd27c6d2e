//! Plugin configuration.
//!
//! Settings are read from a flat string key/value map ([`Properties`]).
//! Every key has a documented default; a value that fails to parse is
//! logged and replaced by that default, never treated as fatal.

use searchbridge_engine::{DatabaseConnection, NodeSettings, OperatingMode};
use searchbridge_types::DomainType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use tracing::error;

pub const KEY_DELIVERY: &str = "search.delivery";
pub const KEY_MODE: &str = "search.mode";
pub const KEY_CLUSTER: &str = "search.cluster";
pub const KEY_ELIGIBLE_PREFIX: &str = "search.eligible.prefix";
pub const KEY_ELIGIBLE_EXCLUDE: &str = "search.eligible.exclude";
pub const KEY_ASYNC_WORKERS: &str = "search.async.workers";
pub const KEY_QUEUE_BATCH_SIZE: &str = "search.queue.batch_size";
pub const KEY_DB_DRIVER: &str = "db.driver";
pub const KEY_DB_URL: &str = "db.url";
pub const KEY_DB_USER: &str = "db.user";
pub const KEY_DB_PASS: &str = "db.pass";

pub const DEFAULT_CLUSTER_NAME: &str = "elasticsearch";
pub const DEFAULT_ELIGIBLE_PREFIX: &str = "models";
pub const DEFAULT_EXCLUDED_FIXTURE: &str = "models.searchbridge.SampleModel";
pub const DEFAULT_ASYNC_WORKERS: usize = 4;
pub const DEFAULT_QUEUE_BATCH_SIZE: usize = 100;

/// Read-only string key/value configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties(BTreeMap<String, String>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses TOML text. Nested tables flatten into dotted keys, so
    /// `[search] mode = "memory"` and `"search.mode" = "memory"` are the same.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let table: toml::Table = text.parse()?;
        let mut props = Self::new();
        flatten_into(&mut props.0, None, &table);
        Ok(props)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

fn flatten_into(out: &mut BTreeMap<String, String>, prefix: Option<&str>, table: &toml::Table) {
    for (key, value) in table {
        let full = match prefix {
            Some(p) => format!("{p}.{key}"),
            None => key.clone(),
        };
        match value {
            toml::Value::Table(inner) => flatten_into(out, Some(&full), inner),
            toml::Value::String(s) => {
                out.insert(full, s.clone());
            }
            toml::Value::Array(items) => {
                let joined = items
                    .iter()
                    .map(|item| match item {
                        toml::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(",");
                out.insert(full, joined);
            }
            other => {
                out.insert(full, other.to_string());
            }
        }
    }
}

/// How index events are applied to the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryMode {
    /// Applied on the caller's task before `dispatch` returns.
    #[default]
    Local,
    /// Handed to background workers; per-subject order is kept.
    Async,
    /// Buffered and applied in batches.
    Queued,
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("LOCAL"),
            Self::Async => f.write_str("ASYNC"),
            Self::Queued => f.write_str("QUEUED"),
        }
    }
}

impl FromStr for DeliveryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOCAL" => Ok(Self::Local),
            "ASYNC" => Ok(Self::Async),
            "QUEUED" => Ok(Self::Queued),
            other => Err(format!("unknown delivery mode: {other}")),
        }
    }
}

/// Decides which searchable types are provisioned at startup.
///
/// A type is eligible when it lives inside `namespace` (if set) and is not
/// listed in `excluded`, which keeps test fixtures out of the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityFilter {
    pub namespace: Option<String>,
    pub excluded: BTreeSet<DomainType>,
}

impl EligibilityFilter {
    /// Accepts every type.
    pub fn allow_all() -> Self {
        Self {
            namespace: None,
            excluded: BTreeSet::new(),
        }
    }

    pub fn is_eligible(&self, domain_type: &DomainType) -> bool {
        if self.excluded.contains(domain_type) {
            return false;
        }
        match &self.namespace {
            Some(ns) => domain_type.is_within(ns),
            None => true,
        }
    }
}

impl Default for EligibilityFilter {
    fn default() -> Self {
        Self {
            namespace: Some(DEFAULT_ELIGIBLE_PREFIX.to_string()),
            excluded: BTreeSet::from([DomainType::new(DEFAULT_EXCLUDED_FIXTURE)]),
        }
    }
}

/// Resolved plugin configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub delivery: DeliveryMode,
    pub mode: OperatingMode,
    pub cluster_name: String,
    pub eligibility: EligibilityFilter,
    pub database: DatabaseConnection,
    /// Worker count for [`DeliveryMode::Async`].
    pub async_workers: usize,
    /// Batch size for [`DeliveryMode::Queued`].
    pub queue_batch_size: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            delivery: DeliveryMode::default(),
            mode: OperatingMode::default(),
            cluster_name: DEFAULT_CLUSTER_NAME.to_string(),
            eligibility: EligibilityFilter::default(),
            database: DatabaseConnection::default(),
            async_workers: DEFAULT_ASYNC_WORKERS,
            queue_batch_size: DEFAULT_QUEUE_BATCH_SIZE,
        }
    }
}

impl BridgeConfig {
    /// Resolves every setting, falling back to the default (and logging an
    /// error) for any value that does not parse.
    pub fn from_properties(props: &Properties) -> Self {
        let defaults = Self::default();

        let cluster_name = match props.get(KEY_CLUSTER).map(str::trim) {
            Some("") => {
                error!(
                    key = KEY_CLUSTER,
                    "Empty cluster name, using default '{DEFAULT_CLUSTER_NAME}'"
                );
                defaults.cluster_name
            }
            Some(name) => name.to_string(),
            None => defaults.cluster_name,
        };

        let eligibility = EligibilityFilter {
            namespace: match props.get(KEY_ELIGIBLE_PREFIX).map(str::trim) {
                Some("") => None,
                Some(ns) => Some(ns.to_string()),
                None => defaults.eligibility.namespace,
            },
            excluded: match props.get(KEY_ELIGIBLE_EXCLUDE) {
                Some(list) => list
                    .split(',')
                    .filter_map(|name| DomainType::parse(name).ok())
                    .collect(),
                None => defaults.eligibility.excluded,
            },
        };

        Self {
            delivery: parse_or_default(props, KEY_DELIVERY, defaults.delivery),
            mode: parse_or_default(props, KEY_MODE, defaults.mode),
            cluster_name,
            eligibility,
            database: DatabaseConnection {
                driver: props.get(KEY_DB_DRIVER).map(str::to_string),
                url: props.get(KEY_DB_URL).map(str::to_string),
                user: props.get(KEY_DB_USER).map(str::to_string),
                password: props.get(KEY_DB_PASS).map(str::to_string),
            },
            async_workers: parse_positive_or_default(props, KEY_ASYNC_WORKERS, defaults.async_workers),
            queue_batch_size: parse_positive_or_default(
                props,
                KEY_QUEUE_BATCH_SIZE,
                defaults.queue_batch_size,
            ),
        }
    }

    /// Node settings for the configured operating mode.
    pub fn node_settings(&self) -> NodeSettings {
        NodeSettings::for_mode(self.mode, self.cluster_name.clone())
    }
}

fn parse_or_default<T>(props: &Properties, key: &str, default: T) -> T
where
    T: FromStr + fmt::Display + Copy,
    T::Err: fmt::Display,
{
    match props.get(key) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            error!(key, value = raw, "Invalid setting ({e}), using default '{default}'");
            default
        }),
    }
}

fn parse_positive_or_default(props: &Properties, key: &str, default: usize) -> usize {
    match props.get(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => {
                error!(key, value = raw, "Expected a positive integer, using default {default}");
                default
            }
        },
    }
}
