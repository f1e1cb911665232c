pub mod contract;
pub mod document;
pub mod entity;
pub mod fileops;
pub mod metadata;
pub mod normalize;
pub mod validate;

pub use contract::{Contract, ContractHierarchy, ContractType, ParsingMetadata, NOT_AVAILABLE};
pub use document::{ConversionResult, Document, DocumentStatus, DocumentType};
pub use entity::{EntitySource, EntityType, RawEntityCandidate, ReconciledEntity};
pub use fileops::{
    fnv1a_hex, operation_hash, FileOperation, OperationKind, TranslationRecord, TranslationStatus,
};
pub use metadata::{ContractMetadata, OPEN_ENDED_YEAR};
pub use normalize::{extract_year, normalize_supplier_name, parse_amount, parse_date_flex};
pub use validate::{
    validate_contract, validate_document, validate_hierarchy, validate_json_structure,
    validation_summary, ValidationSummary,
};
