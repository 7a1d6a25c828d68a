//! docgeom command line
//!
//! `docgeom -c <config> run` loads the configuration, installs logging, opens
//! the source and relational stores and runs the migration once.

pub mod cli;
pub mod commands;
pub mod factories;
pub mod logging;
