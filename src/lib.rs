//! Git history mining engine
//!
//! Runs git over one or more repositories, parses its output and folds the
//! results into a single [`stats::StatisticsAggregator`] that reporting tools
//! consume as JSON.

pub mod app;
pub mod cli;
pub mod collector;
pub mod command;
pub mod config;
pub mod extract;
pub mod git;
pub mod logging;
pub mod output;
pub mod shortstat;
pub mod stats;
