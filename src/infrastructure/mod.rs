//! Infrastructure adapters: configuration loading, logging setup, and the
//! Unix-socket control bridge.

pub mod bridge;
pub mod config;
pub mod logging;
