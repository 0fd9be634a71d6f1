//! Runtime system
//!
//! Script values, host scheduling and the bridge between them.

pub mod bridge;
pub mod scheduler;
pub mod value;
