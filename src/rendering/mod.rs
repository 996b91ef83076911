//! # Rendering Module
//!
//! Text output for terminals and logs. The simulation never depends on it.

pub mod display;

pub use display::*;
