use searchbridge_types::DomainType;
use thiserror::Error;

/// Result type for mapping derivation.
pub type MappingResult<T> = Result<T, MappingError>;

/// Why a type's search mapping could not be derived.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("no index schema declared for {0}")]
    MissingSchema(DomainType),

    #[error("{0} declares no mapped fields")]
    EmptyMapping(DomainType),

    #[error("{domain_type}: invalid index type name {type_name:?}")]
    InvalidTypeName {
        domain_type: DomainType,
        type_name: String,
    },

    #[error("{domain_type}: field {field:?} is mapped more than once")]
    DuplicateField {
        domain_type: DomainType,
        field: String,
    },

    #[error("{domain_type}: field {field:?} has invalid path {path:?} (expected a JSON pointer)")]
    InvalidFieldPath {
        domain_type: DomainType,
        field: String,
        path: String,
    },

    /// Two domain types derived the same index type name.
    #[error("{domain_type}: index type name {type_name:?} is already used by {claimed_by}")]
    DuplicateTypeName {
        domain_type: DomainType,
        type_name: String,
        claimed_by: DomainType,
    },

    #[error("{0}: change feed query is empty")]
    EmptyChangeFeedQuery(DomainType),
}
