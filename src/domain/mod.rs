//! Domain layer
//!
//! Pure domain entities, error taxonomy, and the abstract ports the engine
//! depends on. No infrastructure concerns live here.

pub mod errors;
pub mod models;
pub mod ports;
