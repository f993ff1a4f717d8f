use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;
use url::Url;

const DEFAULT_SHELL: &str = "/bin/sh";
const DEFAULT_POLL_INTERVAL_MS: u64 = 50;
const DEFAULT_INTERRUPT_GRACE_MS: u64 = 2000;

pub const LISTEN_ENV: &str = "CMDEXEC_LISTEN";
pub const WORKDIR_ENV: &str = "CMDEXEC_WORKDIR";
pub const SHELL_ENV: &str = "CMDEXEC_SHELL";
pub const LOG_URL_ENV: &str = "CMDEXEC_LOG_URL";
pub const POLL_INTERVAL_ENV: &str = "CMDEXEC_POLL_INTERVAL_MS";
pub const INTERRUPT_GRACE_ENV: &str = "CMDEXEC_INTERRUPT_GRACE_MS";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub listen: SocketAddr,
    /// Sandbox root every command runs in.
    pub working_dir: PathBuf,
    pub shell: String,
    pub log_url: Option<Url>,
    pub poll_interval: Duration,
    /// Upper bound on how long `stop` waits for output to drain.
    pub interrupt_grace: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let listen = parse_or_default(&lookup, LISTEN_ENV, default_listen);
        let working_dir = lookup(WORKDIR_ENV)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_working_dir);
        let shell = lookup(SHELL_ENV)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SHELL.to_string());
        let log_url = lookup(LOG_URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .and_then(|raw| match Url::parse(&raw) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!(variable = LOG_URL_ENV, value = %raw, error = %e, "Ignoring invalid log URL");
                    None
                }
            });
        let poll_interval = Duration::from_millis(parse_or_default(&lookup, POLL_INTERVAL_ENV, || {
            DEFAULT_POLL_INTERVAL_MS
        }));
        let interrupt_grace =
            Duration::from_millis(parse_or_default(&lookup, INTERRUPT_GRACE_ENV, || {
                DEFAULT_INTERRUPT_GRACE_MS
            }));

        Self {
            listen,
            working_dir,
            shell,
            log_url,
            poll_interval: poll_interval.max(Duration::from_millis(1)),
            interrupt_grace,
        }
    }

    pub fn with_listen(mut self, listen: SocketAddr) -> Self {
        self.listen = listen;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn with_log_url(mut self, url: Option<Url>) -> Self {
        self.log_url = url;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn with_interrupt_grace(mut self, grace: Duration) -> Self {
        self.interrupt_grace = grace;
        self
    }
}

fn parse_or_default<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: impl FnOnce() -> T,
) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(e) => {
                warn!(variable = key, value = %raw, error = %e, "Invalid value, using default");
                default()
            }
        },
        None => default(),
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

fn default_working_dir() -> PathBuf {
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
