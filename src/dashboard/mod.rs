//! Config-driven dashboard: transform, state machine and rendering.

pub mod config;
pub mod engine;
pub mod view;
