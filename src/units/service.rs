use std::fmt;

/// Everything needed to start one service, as read from its unit file.
///
/// Each field is only set if the unit file contained the matching directive. The parser
/// does not check for required directives, that happens right before the service is started.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Service {
    pub name: String,
    pub working_directory: Option<String>,
    pub exec_start: Option<String>,
    /// At most one argument token is supported
    pub arguments: Option<String>,
    /// A single KEY=VALUE pair
    pub environment: Option<String>,
}

impl Service {
    pub fn new(name: &str) -> Service {
        Service {
            name: name.to_owned(),
            ..Default::default()
        }
    }

    /// Name of the first required directive that was not found in the unit file
    pub fn missing_directive(&self) -> Option<&'static str> {
        if self.working_directory.is_none() {
            return Some("WorkingDirectory");
        }
        if self.exec_start.is_none() {
            return Some("ExecStart");
        }
        None
    }

    /// The Environment= setting split into key and value.
    /// None if unset or not of the form KEY=VALUE.
    pub fn environment_pair(&self) -> Option<(&str, &str)> {
        let env = self.environment.as_deref()?;
        let pos = env.find('=')?;
        if pos == 0 {
            return None;
        }
        Some((&env[..pos], &env[pos + 1..]))
    }
}

fn or_unset(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("(unset)")
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Service: {}", self.name)?;
        writeln!(f, "WorkingDirectory: {}", or_unset(&self.working_directory))?;
        writeln!(f, "ExecStart: {}", or_unset(&self.exec_start))?;
        writeln!(f, "Arguments: {}", or_unset(&self.arguments))?;
        write!(f, "Environment: {}", or_unset(&self.environment))
    }
}
