//! # docgeom Configuration Library
//!
//! Type-safe configuration loading and validation for the document geometry
//! migration tool.
//!
//! ## Features
//!
//! - JSON (the legacy format) and TOML files
//! - Legacy PascalCase keys (`Logfile`, `PostgresDB`, `MongoDB`) accepted as aliases
//! - Validation before any store is opened
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docgeom_config::ConfigLoader;
//!
//! let config = ConfigLoader::load_from_file("docgeom.json")?;
//! println!("{}", config.destination.connection_string());
//! # Ok::<(), docgeom_config::ConfigError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod loader;

pub use config::*;
pub use loader::*;
