//! Multi-app portal shell: navigation, routing and config-driven
//! dashboard screens over a shared backend API.

pub mod api;
pub mod app_state;
pub mod dashboard;
pub mod logging;
pub mod navigation;
pub mod query;
pub mod screens;
pub mod settings;
pub mod shell;
pub mod types;
