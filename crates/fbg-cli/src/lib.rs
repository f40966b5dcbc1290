//! CLI library components for the feedback grid.
//!
//! The `fbg` binary is a thin host: [`config`] loads its settings,
//! [`engine`] serves a CSV file as the analytics engine, [`host`] runs the
//! commands over a grid session and [`render`] prints the results.

pub mod config;
pub mod engine;
pub mod host;
pub mod logging;
pub mod render;
