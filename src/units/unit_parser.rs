//! Turn the lines of a unit file into a `Service`.
//!
//! Directives are recognized if the line contains the directive name anywhere, sections are
//! not tracked. All lines are scanned, so if a directive occurs multiple times the last one wins.

use super::Service;
use log::trace;

const WORKING_DIRECTORY: &str = "WorkingDirectory";
const EXEC_START: &str = "ExecStart";
const ENVIRONMENT: &str = "Environment";

/// Cut the line at the first newline (and a carriage return in front of it)
fn trim_newline(line: &str) -> &str {
    let line = match line.find('\n') {
        Some(pos) => &line[..pos],
        None => line,
    };
    line.strip_suffix('\r').unwrap_or(line)
}

/// Everything after `<keyword>=`, counted from where the keyword starts. The character
/// following the keyword is skipped without looking at it.
fn value_after_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let pos = line.find(keyword)?;
    line.get(pos + keyword.len() + 1..).map(trim_newline)
}

/// Split `ExecStart=<cmd> <arg>` at the first '=' and then at the first space
fn split_exec_start(line: &str) -> Option<(&str, Option<&str>)> {
    let pos = line.find('=')?;
    let value = trim_newline(&line[pos + 1..]);
    match value.find(' ') {
        Some(space) => Some((&value[..space], Some(&value[space + 1..]))),
        None => Some((value, None)),
    }
}

pub fn parse_service<S: AsRef<str>>(lines: &[S], name: &str) -> Service {
    let mut service = Service::new(name);

    for line in lines {
        let line = line.as_ref();

        if line.contains(WORKING_DIRECTORY) {
            if let Some(dir) = value_after_keyword(line, WORKING_DIRECTORY) {
                service.working_directory = Some(dir.to_owned());
            }
        }
        if line.contains(EXEC_START) {
            if let Some((cmd, arg)) = split_exec_start(line) {
                service.exec_start = Some(cmd.to_owned());
                service.arguments = arg.map(|arg| arg.to_owned());
            }
        }
        if line.contains(ENVIRONMENT) {
            if let Some(env) = value_after_keyword(line, ENVIRONMENT) {
                service.environment = Some(env.to_owned());
            }
        }
    }

    trace!("Parsed service {}: {:?}", name, service);
    service
}
