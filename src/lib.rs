//! CCA: Claims Assistant
//!
//! Browse AI-enriched healthcare claims, review sentiment statistics and ask
//! free-text questions answered by an external completion service.

pub mod cli;
pub mod core;
pub mod logging;
