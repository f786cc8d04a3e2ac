//! Built-in unit kinds

pub mod builtin;
pub mod command;

pub use builtin::{DelayUnit, LogUnit};
pub use command::CommandUnit;
