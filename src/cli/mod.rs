//! CLI module containing argument parsing and related functionality

pub mod args;

pub use args::{parse_args, parse_args_from, validate_args, Args};
