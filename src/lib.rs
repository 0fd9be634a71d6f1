//! Tickbridge
//!
//! Lets an embedded scripting runtime schedule work on a host engine's tick
//! scheduler, and cancels a script's tasks when the script goes away.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tickbridge::runtime::bridge::ScriptRegistry;
//! use tickbridge::runtime::scheduler::TickScheduler;
//! use tickbridge::runtime::value::{Arity, NativeFunction, ScriptValue};
//!
//! fn main() -> tickbridge::Result<()> {
//!     let host = Arc::new(TickScheduler::new()?);
//!     let registry = ScriptRegistry::new(host.clone());
//!
//!     let context = registry.on_script_loaded("hello");
//!     let scheduler = registry.bridge(&context);
//!     let greet = NativeFunction::new("greet", Arity::Fixed(0), |_| {
//!         println!("Hello from the next tick");
//!         Ok(ScriptValue::Nil)
//!     });
//!     scheduler.run_later(&[greet.into_value(), ScriptValue::Int(20)])?;
//!
//!     host.advance(20);
//!     registry.on_script_unloaded(&context);
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/tickbridge")]
#![warn(rust_2018_idioms)]

// Public modules
pub mod runtime;

// Utility modules
pub mod util;

// Re-exports
pub use anyhow::{Context, Result};
pub use thiserror::Error;

pub use runtime::bridge::{
    BridgeError, ScriptContext, ScriptRegistry, ScriptTask, SchedulerOp, TaskSchedulerBridge,
};
pub use runtime::scheduler::{HostScheduler, TaskId, TickScheduler};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = "tickbridge";
