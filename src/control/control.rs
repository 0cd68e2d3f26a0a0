use crate::config::Config;
use crate::services::{self, ServiceError};
use crate::units::{self, Service, UnitError};
use log::{info, trace};
use nix::unistd::Pid;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    DaemonReload,
    Start(String),
    Stop(String),
    Restart(String),
    Status(String),
    Enable(String),
}

impl Command {
    /// The unit name fragment, if this command works on a unit
    pub fn unit_fragment(&self) -> Option<&str> {
        match self {
            Command::DaemonReload => None,
            Command::Start(name)
            | Command::Stop(name)
            | Command::Restart(name)
            | Command::Status(name)
            | Command::Enable(name) => Some(name),
        }
    }
}

const RELOAD_ACK: &str = "Unit files are read on every invocation, nothing to reload";

/// What a successful command did, printed on stdout
#[derive(Debug)]
pub enum Outcome {
    Acknowledged(&'static str),
    Started(String, Pid),
    Stopped(String, Pid),
    DryRun(Service),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Outcome::Acknowledged(msg) => write!(f, "{}", msg),
            Outcome::Started(name, pid) => write!(f, "Started service {} with pid {}", name, pid),
            Outcome::Stopped(name, pid) => write!(f, "Stopped service {} (pid {})", name, pid),
            Outcome::DryRun(srvc) => write!(f, "{}", srvc),
        }
    }
}

#[derive(Debug)]
pub enum CtlError {
    Usage(String),
    UnknownCommand(String),
    Config(String),
    Unit(UnitError),
    Start(ServiceError),
    Stop(ServiceError),
}

impl CtlError {
    /// Every failure point has its own exit code
    pub fn exit_code(&self) -> i32 {
        match self {
            CtlError::Usage(_) => 1,
            CtlError::UnknownCommand(_) => 2,
            CtlError::Unit(UnitError::DirectoryOpen(_, _))
            | CtlError::Unit(UnitError::NoUnitFiles(_)) => 3,
            CtlError::Unit(UnitError::UnitNotFound(_)) => 4,
            CtlError::Unit(UnitError::FileRead(_, _)) => 5,
            CtlError::Unit(UnitError::Validation(_, _)) => 6,
            CtlError::Start(ServiceError::MissingDirective(_, _)) => 9,
            CtlError::Start(_) => 7,
            CtlError::Stop(_) => 8,
            CtlError::Config(_) => 10,
        }
    }
}

impl fmt::Display for CtlError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CtlError::Usage(msg) => write!(f, "{}", msg),
            CtlError::UnknownCommand(msg) => write!(f, "{}", msg),
            CtlError::Config(msg) => write!(f, "Error while loading the config: {}", msg),
            CtlError::Unit(e) => write!(f, "{}", e),
            CtlError::Start(e) => write!(f, "Error starting service: {}", e),
            CtlError::Stop(e) => write!(f, "Error stopping service: {}", e),
        }
    }
}

impl std::error::Error for CtlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CtlError::Unit(e) => Some(e),
            CtlError::Start(e) | CtlError::Stop(e) => Some(e),
            _ => None,
        }
    }
}

impl From<UnitError> for CtlError {
    fn from(err: UnitError) -> Self {
        CtlError::Unit(err)
    }
}

/// Find the unit file matching `fragment`, check it and parse it into a `Service`
pub fn resolve_unit(fragment: &str, config: &Config) -> Result<Service, CtlError> {
    let files = units::list_unit_files(&config.unit_dir)?;
    if files.is_empty() {
        return Err(UnitError::NoUnitFiles(config.unit_dir.clone()).into());
    }

    let file_name = units::find_by_name_fragment(&files, fragment)
        .ok_or_else(|| UnitError::UnitNotFound(fragment.to_owned()))?;
    let path = config.unit_dir.join(file_name);
    trace!("Unit fragment {} matched file {:?}", fragment, path);

    let lines = units::read_unit_lines(&path)?;
    units::check_sections(&path, config.validation_window)?;

    let srvc = units::parse_service(&lines, units::unit_name(file_name));
    info!("Loaded unit {:?}\n{}", path, srvc);
    Ok(srvc)
}

pub fn execute(cmd: &Command, config: &Config, dry_run: bool) -> Result<Outcome, CtlError> {
    let srvc = match cmd.unit_fragment() {
        Some(fragment) => resolve_unit(fragment, config)?,
        None => return Ok(Outcome::Acknowledged(RELOAD_ACK)),
    };

    if dry_run {
        if let Command::Start(_) = cmd {
            if let Some(directive) = srvc.missing_directive() {
                return Err(CtlError::Start(ServiceError::MissingDirective(
                    srvc.name.clone(),
                    directive,
                )));
            }
        }
        return Ok(Outcome::DryRun(srvc));
    }

    match cmd {
        Command::Start(_) => {
            info!("Starting service {}", srvc.name);
            let pid = services::start_service(&srvc, config).map_err(CtlError::Start)?;
            Ok(Outcome::Started(srvc.name, pid))
        }
        Command::Stop(_) => {
            info!("Stopping service {}", srvc.name);
            let pid = services::stop_service(&srvc.name, config).map_err(CtlError::Stop)?;
            Ok(Outcome::Stopped(srvc.name, pid))
        }
        Command::Restart(_) | Command::Status(_) | Command::Enable(_) => {
            Ok(Outcome::Acknowledged("Not implemented"))
        }
        Command::DaemonReload => Ok(Outcome::Acknowledged(RELOAD_ACK)),
    }
}
