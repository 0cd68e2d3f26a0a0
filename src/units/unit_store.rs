//! Access to the unit directory. Everything in here works on file names and raw content,
//! no directive is interpreted.

use super::{UnitError, REQUIRED_SECTIONS};
use log::trace;
use std::io::Read;
use std::path::Path;

/// Directory entries are unit files if their name contains this
pub const UNIT_SUFFIX: &str = ".service";

/// List all entries of the unit directory whose name contains `.service`.
///
/// The result is sorted by name so the first-match rule of `find_by_name_fragment` does
/// not depend on the enumeration order of the filesystem.
pub fn list_unit_files(dir: &Path) -> Result<Vec<String>, UnitError> {
    let entries =
        std::fs::read_dir(dir).map_err(|e| UnitError::DirectoryOpen(dir.to_path_buf(), e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| UnitError::DirectoryOpen(dir.to_path_buf(), e))?;
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                trace!("Ignore dir entry with non utf8 name: {:?}", raw);
                continue;
            }
        };
        if name.contains(UNIT_SUFFIX) {
            files.push(name);
        }
    }
    files.sort();

    trace!("Found {} unit files in {:?}", files.len(), dir);
    Ok(files)
}

/// First file whose name contains `fragment`.
/// This is a substring match, "net" finds "network.service".
pub fn find_by_name_fragment<'a>(files: &'a [String], fragment: &str) -> Option<&'a str> {
    files
        .iter()
        .find(|name| name.contains(fragment))
        .map(|name| name.as_str())
}

/// The logical name of a unit file: everything before the first `.service`
pub fn unit_name(file_name: &str) -> &str {
    match file_name.find(UNIT_SUFFIX) {
        Some(pos) => &file_name[..pos],
        None => file_name,
    }
}

/// All lines of the unit file. Bytes that are not valid utf8 are replaced, only a failing
/// read is an error.
pub fn read_unit_lines(path: &Path) -> Result<Vec<String>, UnitError> {
    let content = std::fs::read(path).map_err(|e| UnitError::FileRead(path.to_path_buf(), e))?;
    Ok(String::from_utf8_lossy(&content)
        .lines()
        .map(|line| line.to_owned())
        .collect())
}

/// Check that all required section headers appear in the first `window` bytes of the file.
/// A header that only appears after the window counts as missing.
pub fn check_sections(path: &Path, window: u64) -> Result<(), UnitError> {
    let file =
        std::fs::File::open(path).map_err(|e| UnitError::FileRead(path.to_path_buf(), e))?;

    let mut prefix = Vec::new();
    file.take(window)
        .read_to_end(&mut prefix)
        .map_err(|e| UnitError::FileRead(path.to_path_buf(), e))?;
    let prefix = String::from_utf8_lossy(&prefix);

    for section in REQUIRED_SECTIONS.iter().copied() {
        if !prefix.contains(section) {
            return Err(UnitError::Validation(path.to_path_buf(), section));
        }
    }
    Ok(())
}

pub fn validate(path: &Path, window: u64) -> bool {
    check_sections(path, window).is_ok()
}
