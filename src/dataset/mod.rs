//! The performance table and its CSV input boundary.
//!
//! A table is loaded once per invocation and borrowed immutably by
//! every analysis operation. There is no process-wide cache.

pub mod loader;

pub use loader::load_table;

use crate::models::PerformanceRecord;
use std::collections::HashMap;

/// An ordered, immutable collection of performance records.
#[derive(Debug, Clone, Default)]
pub struct PerformanceTable {
    records: Vec<PerformanceRecord>,
}

impl PerformanceTable {
    /// Create a table from records, keeping their order.
    pub fn new(records: Vec<PerformanceRecord>) -> Self {
        Self { records }
    }

    /// All records in table order.
    pub fn records(&self) -> &[PerformanceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Worker ids that appear on more than one row, sorted.
    ///
    /// Lookups still resolve to the first row; this only reports the
    /// data-quality problem.
    pub fn duplicate_worker_ids(&self) -> Vec<&str> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for record in &self.records {
            *counts.entry(record.worker_id.as_str()).or_default() += 1;
        }

        let mut duplicates: Vec<&str> = counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(id, _)| id)
            .collect();
        duplicates.sort_unstable();
        duplicates
    }
}

impl From<Vec<PerformanceRecord>> for PerformanceTable {
    fn from(records: Vec<PerformanceRecord>) -> Self {
        Self::new(records)
    }
}
