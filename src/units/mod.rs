//! Finding, validating and parsing unit files.
//!
//! The unit store only knows about file names and raw content, the parser turns
//! the lines of one unit file into a `Service` descriptor.

mod service;
mod unit_parser;
mod unit_store;

pub use service::*;
pub use unit_parser::*;
pub use unit_store::*;

use std::path::PathBuf;

/// Section headers every unit file has to contain
pub const REQUIRED_SECTIONS: [&str; 3] = ["[Unit]", "[Service]", "[Install]"];

#[derive(Debug)]
pub enum UnitError {
    DirectoryOpen(PathBuf, std::io::Error),
    NoUnitFiles(PathBuf),
    UnitNotFound(String),
    FileRead(PathBuf, std::io::Error),
    Validation(PathBuf, &'static str),
}

impl std::fmt::Display for UnitError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            UnitError::DirectoryOpen(dir, e) => {
                write!(f, "Could not open unit directory {:?}: {}", dir, e)
            }
            UnitError::NoUnitFiles(dir) => {
                write!(f, "Could not get service files from {:?}", dir)
            }
            UnitError::UnitNotFound(fragment) => {
                write!(f, "Service file not found for: {}", fragment)
            }
            UnitError::FileRead(path, e) => {
                write!(f, "Could not read service file {:?}: {}", path, e)
            }
            UnitError::Validation(path, section) => write!(
                f,
                "Service file {:?} is not valid: section {} is missing",
                path, section
            ),
        }
    }
}

impl std::error::Error for UnitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UnitError::DirectoryOpen(_, e) | UnitError::FileRead(_, e) => Some(e),
            _ => None,
        }
    }
}
