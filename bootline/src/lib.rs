//! Bootline Library
//!
//! Concurrent startup of configuration-defined units with a single aggregate
//! result per deployment round.

pub mod app;
pub mod config;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod logs;
pub mod models;
pub mod units;
pub mod utils;
