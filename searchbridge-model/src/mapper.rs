use crate::{ChangeFeedSource, Entity, FieldMapping, IndexSchema, MappingError, MappingResult};
use searchbridge_types::DomainType;
use serde_json::{json, Map, Value};
use std::collections::HashSet;

/// Index type name used when a schema does not declare one: the fully
/// qualified type name, lowercased, with `.` replaced by `_`.
///
/// `models.blog.Post` and `models.forum.Post` get `models_blog_post` and
/// `models_forum_post`.
pub fn default_type_name(domain_type: &DomainType) -> String {
    domain_type.as_str().to_ascii_lowercase().replace('.', "_")
}

/// The validated search mapping of one domain type.
///
/// Built once per type by a [`crate::MapperFactory`] and cached by the sync
/// core until the type is reindexed.
#[derive(Debug, Clone, PartialEq)]
pub struct Mapper {
    domain_type: DomainType,
    type_name: String,
    fields: Vec<FieldMapping>,
    change_feed: Option<ChangeFeedSource>,
}

impl Mapper {
    /// Validates a schema and derives its mapper.
    pub fn from_schema(schema: &IndexSchema) -> MappingResult<Self> {
        let domain_type = schema.domain_type.clone();

        let type_name = match &schema.type_name {
            Some(name) => name.clone(),
            None => default_type_name(&domain_type),
        };
        if type_name.is_empty() || type_name.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(MappingError::InvalidTypeName {
                domain_type,
                type_name,
            });
        }

        if schema.fields.is_empty() {
            return Err(MappingError::EmptyMapping(domain_type));
        }

        let mut seen = HashSet::new();
        for field in &schema.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(MappingError::DuplicateField {
                    domain_type,
                    field: field.name.clone(),
                });
            }
            if !field.field_path.starts_with('/') {
                return Err(MappingError::InvalidFieldPath {
                    domain_type,
                    field: field.name.clone(),
                    path: field.field_path.clone(),
                });
            }
        }

        if let Some(feed) = &schema.change_feed {
            if feed.query.trim().is_empty() {
                return Err(MappingError::EmptyChangeFeedQuery(domain_type));
            }
        }

        Ok(Self {
            domain_type,
            type_name,
            fields: schema.fields.clone(),
            change_feed: schema.change_feed.clone(),
        })
    }

    pub fn domain_type(&self) -> &DomainType {
        &self.domain_type
    }

    /// The index type name documents of this type are stored under.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[FieldMapping] {
        &self.fields
    }

    pub fn change_feed(&self) -> Option<&ChangeFeedSource> {
        self.change_feed.as_ref()
    }

    /// Engine mapping body: `{type_name: {"properties": {...}}}`.
    pub fn mapping(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            let mut spec = Map::new();
            spec.insert("type".into(), json!(field.field_type.engine_name()));
            if !field.analyzed && field.field_type == crate::FieldType::Text {
                spec.insert("index".into(), json!(false));
            }
            properties.insert(field.name.clone(), Value::Object(spec));
        }
        let mut root = Map::new();
        root.insert(self.type_name.clone(), json!({ "properties": properties }));
        Value::Object(root)
    }

    /// Document body for `entity`. Fields absent from the entity are omitted.
    pub fn build_document(&self, entity: &Entity) -> Value {
        let mut doc = Map::new();
        for field in &self.fields {
            if let Some(value) = entity.data.pointer(&field.field_path) {
                if !value.is_null() {
                    doc.insert(field.name.clone(), value.clone());
                }
            }
        }
        Value::Object(doc)
    }

    /// Identifier of `entity`'s document in the index.
    pub fn document_id<'a>(&self, entity: &'a Entity) -> &'a str {
        &entity.id
    }
}
