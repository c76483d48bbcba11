//! Candidate batch DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::admission::{Candidate, CandidateBatch};
use crate::domain::order::OrderSpec;
use crate::domain::shared::{CandidateId, CycleId, Money, Symbol};

/// DTO for one candidate as produced by the upstream scorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDto {
    /// Upstream candidate ID.
    pub id: String,
    /// Symbol.
    pub symbol: String,
    /// Estimated buying power the order consumes.
    pub required_capacity: Decimal,
    /// Order specification.
    pub order: OrderSpec,
}

impl CandidateDto {
    /// Convert to the domain candidate (unranked, unvalidated).
    #[must_use]
    pub fn to_domain(&self) -> Candidate {
        Candidate::new(
            CandidateId::new(&self.id),
            Symbol::new(&self.symbol),
            Money::new(self.required_capacity),
            self.order.clone(),
        )
    }
}

/// DTO for a priority-sorted candidate batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequestDto {
    /// Cycle ID; generated when absent.
    #[serde(default)]
    pub cycle_id: Option<String>,
    /// Candidates, highest priority first.
    #[serde(default)]
    pub candidates: Vec<CandidateDto>,
}

impl BatchRequestDto {
    /// Parse a batch from JSON.
    ///
    /// # Errors
    ///
    /// Returns the serde error if the JSON does not match the batch shape.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The requested cycle ID, or a fresh one.
    #[must_use]
    pub fn cycle_id(&self) -> CycleId {
        self.cycle_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .map_or_else(CycleId::generate, CycleId::new)
    }

    /// Form the candidate batch, keeping the upstream order.
    #[must_use]
    pub fn to_batch(&self) -> CandidateBatch {
        CandidateBatch::new(self.candidates.iter().map(CandidateDto::to_domain).collect())
    }
}
