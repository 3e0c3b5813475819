//! Output: the JSON model dump and the console summary

pub mod dump;
pub mod summary;

pub use dump::{prepare_output_dir, write_statistics, STATISTICS_FILE};
pub use summary::{execution_time_line, format_compact_table, render_summary};
