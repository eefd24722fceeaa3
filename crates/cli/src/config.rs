//! Command-line arguments.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};

use demetsiiify_client::{ClientConfig, DEFAULT_SERVER_URL};

#[derive(Debug, Parser)]
#[command(name = "demetsiiify", version)]
#[command(about = "Create IIIF manifests from METS/MODS documents and follow the conversion")]
pub struct Cli {
    /// Base URL of the conversion service.
    #[arg(long, global = true, env = "DEMETSIIIFY_SERVER", default_value = DEFAULT_SERVER_URL)]
    pub server: String,

    /// Timeout in seconds for import and notification requests.
    #[arg(long, global = true, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,

    /// Where the "welcome dismissed" flag is stored.
    #[arg(long, global = true, env = "DEMETSIIIFY_PREFERENCES", value_name = "PATH")]
    pub preferences: Option<PathBuf>,

    /// More log output (-v, -vv, -vvv).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Submit METS (or DFG-Viewer) URLs and follow the jobs until they settle.
    Import(ImportArgs),
    /// Ask for an e-mail once the given jobs have settled.
    Notify(NotifyArgs),
    /// Stop showing the welcome text.
    DismissWelcome,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    #[arg(required = true, value_name = "URL")]
    pub urls: Vec<String>,

    /// Register this address for a notification once the jobs settle.
    #[arg(long, value_name = "EMAIL")]
    pub notify: Option<String>,

    /// Print the server traceback of failed jobs.
    #[arg(long)]
    pub traceback: bool,

    /// Open the viewer of finished jobs in the browser.
    #[arg(long)]
    pub open: bool,
}

#[derive(Debug, Args)]
pub struct NotifyArgs {
    #[arg(long, value_name = "EMAIL")]
    pub email: String,

    #[arg(required = true, value_name = "JOB_ID")]
    pub jobs: Vec<String>,
}

impl Cli {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.server.clone(),
            request_timeout: Duration::from_secs(self.timeout.max(1)),
            ..ClientConfig::default()
        }
    }

    /// Explicit preferences file, else the per-user default.
    pub fn preferences_path(&self) -> Option<PathBuf> {
        self.preferences
            .clone()
            .or_else(demetsiiify_core::paths::preferences_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("demetsiiify").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_import_args() {
        let cli = parse(&[
            "--server",
            "https://demetsiiify.example.org",
            "import",
            "https://example.org/a.xml",
            "https://example.org/b.xml",
            "--notify",
            "reader@example.org",
            "--open",
            "-vv",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.client_config().base_url, "https://demetsiiify.example.org");
        match cli.command {
            Command::Import(args) => {
                assert_eq!(args.urls.len(), 2);
                assert_eq!(args.notify.as_deref(), Some("reader@example.org"));
                assert!(args.open);
                assert!(!args.traceback);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_import_requires_url() {
        assert!(Cli::try_parse_from(["demetsiiify", "import"]).is_err());
    }

    #[test]
    fn test_notify_args() {
        let cli = parse(&["notify", "--email", "reader@example.org", "a", "b"]);
        match cli.command {
            Command::Notify(args) => {
                assert_eq!(args.email, "reader@example.org");
                assert_eq!(args.jobs, vec!["a", "b"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_timeout_and_preferences() {
        let cli = parse(&["--timeout", "0", "--preferences", "/tmp/prefs.json", "dismiss-welcome"]);
        assert_eq!(cli.client_config().request_timeout, Duration::from_secs(1));
        assert_eq!(cli.preferences_path(), Some(PathBuf::from("/tmp/prefs.json")));
        assert!(matches!(cli.command, Command::DismissWelcome));
    }
}
