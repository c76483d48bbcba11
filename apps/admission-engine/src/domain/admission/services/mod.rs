//! Admission Domain Services

mod result_aggregator;

pub use result_aggregator::ResultAggregator;
