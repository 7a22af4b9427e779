//! Domain layer - command lifecycle values, results, errors and event names
//!
//! Nothing in here performs I/O; adapters and ports build on these types.

pub mod constant;
pub mod error;
pub mod event;
pub mod fixture;
pub mod result;
pub mod statistics;
pub mod status;
pub mod value;
