//! Terminal front end: configuration, input parsing, effect execution and
//! rendering around the pure core.
mod app;
mod commands;
mod config;
mod effects;
mod render;

pub use app::run_app;
