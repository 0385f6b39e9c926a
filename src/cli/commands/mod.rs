//! CLI command implementations

pub mod utils;

pub mod ask;
pub mod claims;
pub mod completions;
pub mod config;
pub mod overview;
pub mod sentiment;
pub mod shell;
pub mod show;
