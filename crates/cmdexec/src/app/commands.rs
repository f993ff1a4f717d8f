use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueHint;
pub use clap_complete::Shell;
use std::net::SocketAddr;
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

const AFTER_LONG_HELP: &str = r#"WORKFLOW:
    1. Start the service with 'cmdexec serve'
    2. Start a command and note its process id
    3. Poll its status until it is no longer running
    4. Stop it early if needed

EXAMPLES:
    cmdexec serve --workdir /srv/sandbox
    cmdexec start -- ls -la
    cmdexec start --timeout 10 -- "sleep 30"
    cmdexec status 0b6f3c1e-...
    cmdexec stop 0b6f3c1e-...
    cmdexec run -- "make test""#;

#[derive(Debug, Parser)]
#[command(name = "cmdexec")]
#[command(author, version, propagate_version = true)]
#[command(about = "Run shell commands in pseudo-terminals and poll their output over HTTP")]
#[command(after_long_help = AFTER_LONG_HELP)]
#[command(subcommand_required = true, arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Base URL of a running service
    #[arg(
        long,
        global = true,
        env = "CMDEXEC_URL",
        value_name = "URL",
        default_value = DEFAULT_SERVER_URL
    )]
    pub server: Url,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP service in the foreground
    #[command(long_about = "\
Run the HTTP service in the foreground.

Unset options fall back to CMDEXEC_LISTEN, CMDEXEC_WORKDIR, CMDEXEC_SHELL and
CMDEXEC_LOG_URL. SIGINT or SIGTERM stops every running command and exits.")]
    Serve(ServeArgs),

    /// Start a command and print its process id
    Start(StartArgs),

    /// Interrupt a running command
    Stop {
        #[arg(value_name = "ID")]
        process_id: String,
    },

    /// Show whether a command is running and its output so far
    Status {
        #[arg(value_name = "ID")]
        process_id: String,
    },

    /// List every command the service has started
    #[command(visible_alias = "ls")]
    List,

    /// Start a command and stream its output until it finishes
    Run {
        #[command(flatten)]
        start: StartArgs,

        /// Status poll interval in milliseconds
        #[arg(long, value_name = "MS", default_value_t = 200)]
        poll_ms: u64,
    },

    /// Check that the service is up
    Health,

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Args)]
pub struct StartArgs {
    /// Kill the command after this many seconds
    #[arg(short, long, value_name = "SECS")]
    pub timeout: Option<i64>,

    /// Shell command line; multiple words are joined with spaces
    #[arg(
        value_name = "COMMAND",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_hint = ValueHint::CommandString
    )]
    pub command: Vec<String>,
}

impl StartArgs {
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<SocketAddr>,

    /// Directory every command runs in
    #[arg(long, value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub workdir: Option<PathBuf>,

    /// Shell used as `<shell> -c <command>`
    #[arg(long, value_name = "PATH", value_hint = ValueHint::ExecutablePath)]
    pub shell: Option<String>,

    /// Base URL of the logging service
    #[arg(long, value_name = "URL")]
    pub log_url: Option<Url>,
}
