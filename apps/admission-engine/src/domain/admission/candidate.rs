//! Candidate orders and the ordered batch they arrive in.

use crate::domain::order::OrderSpec;
use crate::domain::shared::{CandidateId, DomainError, Money, Symbol};

/// A proposed order awaiting an admission decision.
///
/// Immutable once the batch is formed. The `rank` is the candidate's position
/// in its batch (0 is the highest priority).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    id: CandidateId,
    symbol: Symbol,
    required_capacity: Money,
    rank: u32,
    order: OrderSpec,
}

impl Candidate {
    /// Create a candidate. The rank is assigned when it joins a batch.
    #[must_use]
    pub const fn new(
        id: CandidateId,
        symbol: Symbol,
        required_capacity: Money,
        order: OrderSpec,
    ) -> Self {
        Self {
            id,
            symbol,
            required_capacity,
            rank: 0,
            order,
        }
    }

    /// Upstream candidate id.
    #[must_use]
    pub const fn id(&self) -> &CandidateId {
        &self.id
    }

    /// Instrument symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Estimated buying power this order consumes.
    #[must_use]
    pub const fn required_capacity(&self) -> Money {
        self.required_capacity
    }

    /// Position in the batch (0 = highest priority).
    #[must_use]
    pub const fn rank(&self) -> u32 {
        self.rank
    }

    /// Order specification passed to the gateway untouched.
    #[must_use]
    pub const fn order(&self) -> &OrderSpec {
        &self.order
    }

    /// Structural validation; a failure here means the candidate is never
    /// submitted.
    ///
    /// # Errors
    ///
    /// Returns the first problem found with the id, symbol, cost, or order.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.id.is_blank() {
            return Err(DomainError::InvalidValue {
                field: "candidate_id".to_string(),
                message: "Candidate id cannot be empty".to_string(),
            });
        }
        self.symbol.validate()?;
        self.required_capacity.validate_as_cost("required_capacity")?;
        self.order.validate()
    }
}

/// An ordered, immutable snapshot of candidates for one cycle.
///
/// The upstream source is trusted to have priority-sorted the candidates; the
/// batch only stamps each one with its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateBatch {
    candidates: Vec<Candidate>,
}

impl CandidateBatch {
    /// Form a batch, ranking candidates by their position.
    #[must_use]
    pub fn new(candidates: Vec<Candidate>) -> Self {
        let candidates = candidates
            .into_iter()
            .zip(0u32..)
            .map(|(mut candidate, rank)| {
                candidate.rank = rank;
                candidate
            })
            .collect();
        Self { candidates }
    }

    /// Number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Returns true if the batch has no candidates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidates in priority order.
    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.candidates.iter()
    }

    /// Sum of every candidate's required capacity.
    #[must_use]
    pub fn total_required(&self) -> Money {
        self.candidates.iter().map(Candidate::required_capacity).sum()
    }
}

impl<'a> IntoIterator for &'a CandidateBatch {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{OrderSide, OrderSpec};
    use rust_decimal_macros::dec;

    fn candidate(id: &str, symbol: &str, dollars: i64) -> Candidate {
        Candidate::new(
            CandidateId::new(id),
            Symbol::new(symbol),
            Money::dollars(dollars),
            OrderSpec::market(OrderSide::Buy, dec!(10)),
        )
    }

    #[test]
    fn batch_assigns_ranks_in_order() {
        let batch = CandidateBatch::new(vec![
            candidate("a", "AAPL", 100),
            candidate("b", "MSFT", 200),
            candidate("c", "NVDA", 300),
        ]);

        let ranks: Vec<u32> = batch.iter().map(Candidate::rank).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
        let ids: Vec<&str> = batch.iter().map(|c| c.id().as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn batch_total_required() {
        let batch = CandidateBatch::new(vec![
            candidate("a", "AAPL", 25_000),
            candidate("b", "MSFT", 24_500),
        ]);
        assert_eq!(batch.total_required(), Money::dollars(49_500));
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn empty_batch() {
        let batch = CandidateBatch::default();
        assert!(batch.is_empty());
        assert_eq!(batch.total_required(), Money::ZERO);
    }

    #[test]
    fn validate_accepts_well_formed_candidate() {
        assert!(candidate("a", "AAPL", 100).validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_id() {
        let err = candidate(" ", "AAPL", 100).validate().unwrap_err();
        assert!(err.to_string().contains("candidate_id"));
    }

    #[test]
    fn validate_rejects_non_positive_cost() {
        let err = candidate("a", "AAPL", 0).validate().unwrap_err();
        assert!(err.to_string().contains("required_capacity"));
    }

    #[test]
    fn validate_rejects_bad_order() {
        let c = Candidate::new(
            CandidateId::new("a"),
            Symbol::new("AAPL"),
            Money::dollars(100),
            OrderSpec::market(OrderSide::Buy, dec!(0)),
        );
        assert!(c.validate().is_err());
    }
}
