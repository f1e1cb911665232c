//! Entity taxonomy and candidate types shared by all extraction passes.

use serde::{Deserialize, Serialize};

/// Semantic categories an extraction pass can assign to a span of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Supplier,
    Customer,
    ContractId,
    ContractType,
    StartDate,
    EndDate,
    Amount,
    Currency,
    ServiceType,
    BusinessArea,
    ProjectScope,
    SignatureDate,
    EffectiveDate,
    ExpirationDate,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Supplier => "SUPPLIER",
            EntityType::Customer => "CUSTOMER",
            EntityType::ContractId => "CONTRACT_ID",
            EntityType::ContractType => "CONTRACT_TYPE",
            EntityType::StartDate => "START_DATE",
            EntityType::EndDate => "END_DATE",
            EntityType::Amount => "AMOUNT",
            EntityType::Currency => "CURRENCY",
            EntityType::ServiceType => "SERVICE_TYPE",
            EntityType::BusinessArea => "BUSINESS_AREA",
            EntityType::ProjectScope => "PROJECT_SCOPE",
            EntityType::SignatureDate => "SIGNATURE_DATE",
            EntityType::EffectiveDate => "EFFECTIVE_DATE",
            EntityType::ExpirationDate => "EXPIRATION_DATE",
        }
    }

    /// True for every date-valued type; these normalize to ISO `YYYY-MM-DD`.
    pub fn is_date(&self) -> bool {
        matches!(
            self,
            EntityType::StartDate
                | EntityType::EndDate
                | EntityType::SignatureDate
                | EntityType::EffectiveDate
                | EntityType::ExpirationDate
        )
    }
}

/// Which extraction pass produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntitySource {
    TokenModel,
    ClassificationModel,
    DomainPattern,
}

impl EntitySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntitySource::TokenModel => "token-model",
            EntitySource::ClassificationModel => "classification-model",
            EntitySource::DomainPattern => "domain-pattern",
        }
    }
}

/// One scored span emitted by a single extraction pass.
///
/// Immutable once created; the reconciler consumes candidates by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEntityCandidate {
    pub text: String,
    pub entity_type: EntityType,
    /// Character offset into the source text, `-1` when the pass cannot
    /// locate the span.
    pub start_pos: i64,
    pub end_pos: i64,
    pub confidence: f32,
    pub source: EntitySource,
}

/// The winning candidate for one `(normalized_text, entity_type)` group.
///
/// Reconciliation guarantees that no two reconciled entities share a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledEntity {
    pub text: String,
    pub normalized_text: String,
    pub entity_type: EntityType,
    pub start_pos: i64,
    pub end_pos: i64,
    pub confidence: f32,
    pub source: EntitySource,
}

impl ReconciledEntity {
    pub fn from_candidate(candidate: RawEntityCandidate, normalized_text: String) -> Self {
        ReconciledEntity {
            text: candidate.text,
            normalized_text,
            entity_type: candidate.entity_type,
            start_pos: candidate.start_pos,
            end_pos: candidate.end_pos,
            confidence: candidate.confidence,
            source: candidate.source,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_type_serializes_screaming_snake() {
        let json = serde_json::to_string(&EntityType::ContractId).unwrap();
        assert_eq!(json, "\"CONTRACT_ID\"");
        let back: EntityType = serde_json::from_str("\"EXPIRATION_DATE\"").unwrap();
        assert_eq!(back, EntityType::ExpirationDate);
    }

    #[test]
    fn source_serializes_kebab() {
        let json = serde_json::to_string(&EntitySource::TokenModel).unwrap();
        assert_eq!(json, "\"token-model\"");
        assert_eq!(EntitySource::DomainPattern.as_str(), "domain-pattern");
    }

    #[test]
    fn date_types_are_dates() {
        assert!(EntityType::StartDate.is_date());
        assert!(EntityType::SignatureDate.is_date());
        assert!(!EntityType::Amount.is_date());
        assert!(!EntityType::Supplier.is_date());
    }

    #[test]
    fn reconciled_keeps_candidate_fields() {
        let c = RawEntityCandidate {
            text: "TechCorp".into(),
            entity_type: EntityType::Supplier,
            start_pos: 10,
            end_pos: 18,
            confidence: 0.92,
            source: EntitySource::TokenModel,
        };
        let r = ReconciledEntity::from_candidate(c, "techcorp".into());
        assert_eq!(r.text, "TechCorp");
        assert_eq!(r.normalized_text, "techcorp");
        assert_eq!(r.start_pos, 10);
        assert_eq!(r.confidence, 0.92);
    }
}
