//! Built-in commands operating on tax-credit test fixtures

pub mod delete;
pub mod generate;
pub mod store;
pub mod validate;
