use searchbridge_types::DomainType;
use serde::{Deserialize, Serialize};

/// Declares how a domain type is indexed.
///
/// This is the host-side declaration; [`crate::Mapper::from_schema`] validates
/// it and derives the mapping the core works with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSchema {
    pub domain_type: DomainType,
    /// Index type name. Defaults to [`crate::default_type_name`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    pub fields: Vec<FieldMapping>,
    /// Present when documents of this type are fed from a database query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_feed: Option<ChangeFeedSource>,
}

impl IndexSchema {
    pub fn new(domain_type: impl Into<DomainType>, fields: Vec<FieldMapping>) -> Self {
        Self {
            domain_type: domain_type.into(),
            type_name: None,
            fields,
            change_feed: None,
        }
    }

    /// Overrides the index type name.
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Declares a change feed fed by `query`.
    pub fn with_change_feed(mut self, query: impl Into<String>) -> Self {
        self.change_feed = Some(ChangeFeedSource {
            query: query.into(),
        });
        self
    }
}

/// A database query that streams rows straight into the type's index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeFeedSource {
    pub query: String,
}

/// One document field and where its value comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Name of the field in the search document.
    pub name: String,
    /// JSON pointer into [`crate::Entity::data`] (e.g., "/title").
    pub field_path: String,
    pub field_type: FieldType,
    /// Whether the engine should run full-text analysis on the value.
    #[serde(default)]
    pub analyzed: bool,
}

impl FieldMapping {
    fn simple(name: &str, field_type: FieldType, analyzed: bool) -> Self {
        Self {
            name: name.into(),
            field_path: format!("/{name}"),
            field_type,
            analyzed,
        }
    }

    /// Full-text field.
    pub fn text(name: &str) -> Self {
        Self::simple(name, FieldType::Text, true)
    }

    /// Exact-match string field.
    pub fn keyword(name: &str) -> Self {
        Self::simple(name, FieldType::Keyword, false)
    }

    pub fn long(name: &str) -> Self {
        Self::simple(name, FieldType::Long, false)
    }

    pub fn double(name: &str) -> Self {
        Self::simple(name, FieldType::Double, false)
    }

    pub fn boolean(name: &str) -> Self {
        Self::simple(name, FieldType::Boolean, false)
    }

    pub fn date(name: &str) -> Self {
        Self::simple(name, FieldType::Date, false)
    }

    pub fn geo_point(name: &str) -> Self {
        Self::simple(name, FieldType::GeoPoint, false)
    }

    /// Nested object copied as-is.
    pub fn object(name: &str) -> Self {
        Self::simple(name, FieldType::Object, false)
    }

    /// Reads the value from a different location in the entity data.
    pub fn at(mut self, field_path: &str) -> Self {
        self.field_path = field_path.into();
        self
    }
}

/// The engine-side type of a mapped field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Keyword,
    Long,
    Double,
    Boolean,
    Date,
    GeoPoint,
    Object,
}

impl FieldType {
    /// Name of the type in an engine mapping.
    pub const fn engine_name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Keyword => "keyword",
            Self::Long => "long",
            Self::Double => "double",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::GeoPoint => "geo_point",
            Self::Object => "object",
        }
    }
}
