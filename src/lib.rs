// This file exposes the modules as public modules in the crate

pub mod config;
pub mod file_ops;
pub mod file_reader;
pub mod logging;
pub mod mcp;
pub mod paths;
pub mod structure;
