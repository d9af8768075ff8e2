//! Filter configuration module

pub mod filter_config;
pub mod null_handling;

pub use filter_config::*;
pub use null_handling::*;
