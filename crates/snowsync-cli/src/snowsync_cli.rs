//! Library half of the `snowsync` binary
//!
//! Everything the commands do lives here so it can be driven from tests
//! without spawning the binary.

mod commands;
mod config;
pub mod logging;

pub use commands::*;
pub use config::*;
