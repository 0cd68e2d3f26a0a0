use super::ServiceError;
use crate::config::Config;
use nix::unistd::Pid;
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

/// The file that remembers the pid of the most recently started instance of a service.
/// Its existence is the only state that is kept about a service.
#[derive(Debug, Clone)]
pub struct PidMarker {
    name: String,
    path: PathBuf,
}

impl PidMarker {
    pub fn new(dir: &Path, prefix: &str, name: &str) -> PidMarker {
        PidMarker {
            name: name.to_owned(),
            path: dir.join(format!("{}{}", prefix, name)),
        }
    }

    pub fn for_service(config: &Config, name: &str) -> PidMarker {
        PidMarker::new(&config.marker_dir, &config.marker_prefix, name)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub(crate) fn c_path(&self) -> Result<CString, ServiceError> {
        CString::new(self.path.as_os_str().as_bytes()).map_err(|_| {
            ServiceError::Exec(
                self.name.clone(),
                format!("pid marker path contains a nul byte: {:?}", self.path),
            )
        })
    }

    /// Create the marker, failing if it already exists. The pid is filled in later by the child.
    pub fn reserve(&self) -> Result<(), ServiceError> {
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(ServiceError::MarkerExists(self.path.clone()))
            }
            Err(e) => Err(ServiceError::MarkerWrite(self.path.clone(), e)),
        }
    }

    /// Overwrite the marker with the given pid. The forked child writes it with raw syscalls,
    /// this is for tests that need a marker without a service.
    #[cfg(test)]
    pub fn write(&self, pid: Pid) -> Result<(), ServiceError> {
        std::fs::write(&self.path, format!("{}", pid))
            .map_err(|e| ServiceError::MarkerWrite(self.path.clone(), e))
    }

    pub fn read(&self) -> Result<Pid, ServiceError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ServiceError::PidMarkerMissing(self.name.clone()));
            }
            Err(e) => return Err(ServiceError::MarkerRead(self.path.clone(), e)),
        };

        // 0 and negative values would signal whole process groups
        match content.trim().parse::<i32>() {
            Ok(pid) if pid > 0 => Ok(Pid::from_raw(pid)),
            _ => Err(ServiceError::InvalidPidMarker(self.path.clone(), content)),
        }
    }

    pub fn remove(&self) -> Result<(), ServiceError> {
        std::fs::remove_file(&self.path)
            .map_err(|e| ServiceError::MarkerDelete(self.path.clone(), e))
    }
}
