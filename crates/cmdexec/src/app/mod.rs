use std::io;
use std::io::Write;
use std::thread;
use std::time::Duration;

use clap::CommandFactory;
use clap::Parser;
use clap_complete::generate;
use tracing::debug;

pub mod client;
pub mod commands;
pub mod daemon;
mod presenter;

use crate::app::client::{ApiClient, ClientError};
use crate::app::commands::{Cli, Commands, ServeArgs, StartArgs};
use crate::app::presenter::{JsonPresenter, Presenter, TextPresenter};
use crate::common::DaemonError;
use crate::common::error_codes::ErrorCategory;
use crate::common::telemetry;
use crate::infra::daemon::ServiceConfig;

const PROGRAM_NAME: &str = "cmdexec";

/// Exit codes following sysexits.h.
mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const USAGE: i32 = 64;
    pub const UNAVAILABLE: i32 = 69;
    pub const CONFIG: i32 = 78;
    pub const IOERR: i32 = 74;
}

fn exit_code_for_client_error(error: &ClientError) -> i32 {
    match error.category() {
        Some(ErrorCategory::InvalidInput) => exit_codes::USAGE,
        Some(ErrorCategory::NotFound) => exit_codes::UNAVAILABLE,
        Some(ErrorCategory::External) | Some(ErrorCategory::Internal) => exit_codes::IOERR,
        None => exit_codes::GENERAL_ERROR,
    }
}

fn exit_code_for_daemon_error(error: &DaemonError) -> i32 {
    match error.category() {
        ErrorCategory::InvalidInput => exit_codes::CONFIG,
        _ => exit_codes::IOERR,
    }
}

pub struct Application;

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Application {
    pub fn new() -> Self {
        Self
    }

    /// Parses the command line, runs it and returns the process exit code.
    ///
    /// Client and service errors are reported here; anything else is
    /// returned to the caller.
    pub fn run(&self) -> anyhow::Result<i32> {
        let cli = Cli::parse();
        let default_level = match (&cli.command, cli.verbose) {
            (_, true) => "debug",
            (Commands::Serve(_), false) => "info",
            _ => "warn",
        };
        let _telemetry = telemetry::init_tracing(default_level);
        debug!(command = ?cli.command, server = %cli.server, "CLI command parsed");

        let mut presenter: Box<dyn Presenter> = if cli.json {
            Box::new(JsonPresenter::new(io::stdout(), io::stderr()))
        } else {
            Box::new(TextPresenter::new(io::stdout(), io::stderr()))
        };

        match self.execute(cli, presenter.as_mut()) {
            Ok(()) => Ok(exit_codes::SUCCESS),
            Err(e) => {
                if let Some(client_error) = e.downcast_ref::<ClientError>() {
                    presenter.present_client_error(client_error);
                    return Ok(exit_code_for_client_error(client_error));
                }
                if let Some(daemon_error) = e.downcast_ref::<DaemonError>() {
                    let mut stderr = io::stderr().lock();
                    let _ = writeln!(stderr, "{PROGRAM_NAME}: Error: {daemon_error}");
                    let _ = writeln!(stderr, "Suggestion: {}", daemon_error.suggestion());
                    return Ok(exit_code_for_daemon_error(daemon_error));
                }
                Err(e)
            }
        }
    }

    fn execute(&self, cli: Cli, presenter: &mut dyn Presenter) -> anyhow::Result<()> {
        let server = cli.server;
        match cli.command {
            Commands::Serve(args) => {
                daemon::start_daemon(service_config(args))?;
            }
            Commands::Completions { shell } => {
                let mut cmd = Cli::command();
                generate(shell, &mut cmd, PROGRAM_NAME, &mut io::stdout());
            }
            Commands::Start(args) => {
                let client = ApiClient::new(server)?;
                let response = client.start(&args.command_line(), args.timeout)?;
                presenter.present_started(&response);
            }
            Commands::Stop { process_id } => {
                let client = ApiClient::new(server)?;
                let response = client.stop(&process_id)?;
                presenter.present_stopped(&process_id, &response);
            }
            Commands::Status { process_id } => {
                let client = ApiClient::new(server)?;
                presenter.present_status(&client.status(&process_id)?);
            }
            Commands::List => {
                let client = ApiClient::new(server)?;
                presenter.present_list(&client.list()?);
            }
            Commands::Health => {
                let client = ApiClient::new(server)?;
                presenter.present_health(&client.health()?);
            }
            Commands::Run { start, poll_ms } => {
                let client = ApiClient::new(server)?;
                follow(&client, &start, Duration::from_millis(poll_ms.max(10)), presenter)?;
            }
        }
        Ok(())
    }
}

fn service_config(args: ServeArgs) -> ServiceConfig {
    let mut config = ServiceConfig::from_env();
    if let Some(listen) = args.listen {
        config = config.with_listen(listen);
    }
    if let Some(dir) = args.workdir {
        config = config.with_working_dir(dir);
    }
    if let Some(shell) = args.shell {
        config = config.with_shell(shell);
    }
    if args.log_url.is_some() {
        config = config.with_log_url(args.log_url);
    }
    config
}

/// Starts a command and prints its output as it grows until it stops.
fn follow(
    client: &ApiClient,
    args: &StartArgs,
    poll: Duration,
    presenter: &mut dyn Presenter,
) -> Result<(), ClientError> {
    let started = client.start(&args.command_line(), args.timeout)?;
    let id = started.process_id;
    let mut printed = 0usize;

    loop {
        let status = client.status(&id)?;
        if let Some(fresh) = status.output.get(printed..) {
            if !fresh.is_empty() {
                presenter.present_output(fresh);
                printed = status.output.len();
            }
        }
        if !status.running {
            presenter.present_finished(&id, &status);
            return Ok(());
        }
        thread::sleep(poll);
    }
}
