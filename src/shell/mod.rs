//! Host shell: the application frame, routing and the screen factory.

pub mod app;
pub mod factory;
