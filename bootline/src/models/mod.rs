//! Data models

pub mod unit;
