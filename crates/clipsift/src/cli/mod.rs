//! Command implementations for the `clipsift` binary.

pub mod classify;
pub mod config;
pub mod interactive;
pub mod models;
pub mod open;
