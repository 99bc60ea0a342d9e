//! Parsing and validation of `archfpga.toml` build options.
//!
//! The options only steer how the architecture model is built: whether the
//! leaf timing checks run and which diagnostic codes are promoted to
//! failures or silenced. A missing file is not an error for callers that
//! use [`ArchConfig::default`].

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
