//! Script value interface
//!
//! The narrow slice of a script runtime's value model that the scheduler
//! bridge consumes: callables with a declared arity, and numeric arguments.

pub mod script_value;
pub use script_value::*;

#[cfg(test)]
mod tests;
