//! Comparative KPI analysis.
//!
//! Everything in this module is synchronous and side-effect free; the
//! table is only ever borrowed.

pub mod comparison;
pub mod density;
pub mod levels;
pub mod stats;
pub mod summary;

pub use comparison::{
    compare_with_peers, compare_with_subordinates, compute_comparison, extract_scores,
    supervisor_ids, Comparison,
};
pub use density::{histogram, kde_curve, normal_density_curve};
pub use levels::{compute_group_level_summary, OrgLevel, PositionClassifier};
pub use stats::{normalize_scores, SkewnessEstimator};
pub use summary::{summarize_dataset, summarize_records};
