//! Engine configuration loaded from YAML

pub mod settings;

pub use settings::*;
