//! Ports - the traits at the engine's seams

pub mod command;
pub mod fixture;
pub mod listener;
