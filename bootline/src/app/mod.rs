//! Application bootstrap and lifecycle

pub mod bootstrap;
pub mod options;
pub mod run;
