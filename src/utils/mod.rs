//! Utility functions and types

mod metrics;
mod sequence;
pub mod data_loader;

pub use data_loader::DataLoader;
pub use metrics::{format_duration, time_callable, Timer};
pub use sequence::{format_sequence, print_sequence};
