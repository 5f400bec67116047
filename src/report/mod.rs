//! Report rendering.

pub mod generator;

pub use generator::{
    generate_comparison_markdown, generate_json_report, generate_levels_markdown,
    generate_summary_markdown,
};
