//! Service Configuration Module
//!
//! Configuration is loaded from TOML once at startup and handed to the
//! application context; there is no global.
//!
//! ## Loading Order
//!
//! 1. `--config <path>` on the command line
//! 2. `RECORE_CONFIG` environment variable (path to TOML file)
//! 3. `recore.toml` in the current working directory
//! 4. Built-in defaults
//!
//! `RECORE_STORE_URI` (or `MONGO_URI`), `RECORE_MODEL_DIR` and
//! `RECORE_SERVER_ADDR` override the file afterwards.

pub mod defaults;
mod service_config;
pub mod validation;

pub use service_config::*;
