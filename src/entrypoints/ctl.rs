use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use log::trace;
use std::ffi::OsString;

use crate::config;
use crate::control::{self, Command, CtlError};
use crate::logging;

#[derive(Parser, Debug)]
#[clap(name = "psysctl", version, about = "Start and stop services described by unit files")]
struct CliArgs {
    /// Directory containing psysd_config.toml or psysd_config.json
    #[clap(short, long, value_parser)]
    conf: Option<std::path::PathBuf>,
    /// Only find, validate and parse the unit, do not touch any process
    #[clap(long)]
    dry_run: bool,
    /// Log everything
    #[clap(short, long)]
    verbose: bool,
    #[clap(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Acknowledged only, unit files are read on every invocation
    DaemonReload,
    /// Start the first service whose unit file name contains NAME
    Start { name: String },
    /// Stop the first service whose unit file name contains NAME
    Stop { name: String },
    /// Not implemented
    Restart { name: String },
    /// Not implemented
    Status { name: String },
    /// Not implemented
    Enable { name: String },
}

impl From<CliCommand> for Command {
    fn from(cmd: CliCommand) -> Self {
        match cmd {
            CliCommand::DaemonReload => Command::DaemonReload,
            CliCommand::Start { name } => Command::Start(name),
            CliCommand::Stop { name } => Command::Stop(name),
            CliCommand::Restart { name } => Command::Restart(name),
            CliCommand::Status { name } => Command::Status(name),
            CliCommand::Enable { name } => Command::Enable(name),
        }
    }
}

fn first_line(msg: &str) -> String {
    msg.lines().next().unwrap_or_default().to_owned()
}

fn report(err: CtlError) -> i32 {
    eprintln!("{}", err);
    err.exit_code()
}

fn parse_args<I, T>(args: I) -> Result<Option<CliArgs>, CtlError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match CliArgs::try_parse_from(args) {
        Ok(cli_args) => Ok(Some(cli_args)),
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                let _ = e.print();
                Ok(None)
            }
            ErrorKind::InvalidSubcommand => {
                Err(CtlError::UnknownCommand(first_line(&e.to_string())))
            }
            _ => Err(CtlError::Usage(first_line(&e.to_string()))),
        },
    }
}

/// Run the control utility with the given command line. Returns the exit code.
pub fn run_ctl_with_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli_args = match parse_args(args) {
        Ok(Some(cli_args)) => cli_args,
        Ok(None) => return 0,
        Err(e) => return report(e),
    };

    let command: Command = match cli_args.command {
        Some(cmd) => cmd.into(),
        // nothing to do
        None => return 0,
    };

    let (mut log_conf, conf) = config::load_config(&cli_args.conf);
    if cli_args.verbose {
        log_conf.log_level = log::LevelFilter::Trace;
    }
    if let Err(e) = logging::setup_logging(&log_conf) {
        eprintln!("Continuing without logging: {}", e);
    }

    let conf = match conf {
        Ok(conf) => conf,
        Err(e) => return report(CtlError::Config(e)),
    };
    trace!("Using config: {:?}", conf);

    match control::execute(&command, &conf, cli_args.dry_run) {
        Ok(outcome) => {
            println!("{}", outcome);
            0
        }
        Err(e) => report(e),
    }
}

pub fn run_ctl() -> i32 {
    run_ctl_with_args(std::env::args_os())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_is_success() {
        assert_eq!(run_ctl_with_args(vec!["psysctl"]), 0);
    }

    #[test]
    fn argument_errors() {
        // unknown command
        assert_eq!(run_ctl_with_args(vec!["psysctl", "frobnicate", "web"]), 2);
        assert_eq!(run_ctl_with_args(vec!["psysctl", "reload"]), 2);
        // wrong number of arguments
        assert_eq!(run_ctl_with_args(vec!["psysctl", "start"]), 1);
        assert_eq!(run_ctl_with_args(vec!["psysctl", "stop", "web", "db"]), 1);
        assert_eq!(run_ctl_with_args(vec!["psysctl", "daemon-reload", "web"]), 1);
    }

    #[test]
    fn commands_are_parsed() {
        let cli_args = parse_args(vec!["psysctl", "--dry-run", "start", "web"])
            .unwrap()
            .unwrap();
        assert!(cli_args.dry_run);
        let cmd: Command = cli_args.command.unwrap().into();
        assert_eq!(cmd, Command::Start("web".to_owned()));

        let cli_args = parse_args(vec!["psysctl", "daemon-reload"]).unwrap().unwrap();
        let cmd: Command = cli_args.command.unwrap().into();
        assert_eq!(cmd, Command::DaemonReload);
        assert_eq!(cmd.unit_fragment(), None);
    }
}
