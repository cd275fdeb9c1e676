// src/lib.rs - Library interface for internal module access

pub mod config;
pub mod constants;
pub mod contour;
pub mod data_input;
pub mod error;
pub mod font_config;
pub mod layout;
pub mod output;
pub mod overlay;
pub mod plot_framework;
pub mod plot_functions;
pub mod time_axis;
pub mod types;

pub use error::{PlotError, Result};

// Expose crate version at compile time.
pub fn crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
