//! Configuration document and loader

pub mod loader;
pub mod settings;

pub use loader::ConfigLoader;
pub use settings::Settings;
