// src/cli.rs
use clap::Parser;

/// check-service-certs: service certificate expiration checker
///
/// Reads every configured service certificate, and emails / posts to Slack
/// when one will expire within its configured minimum lifetime.
#[derive(Parser, Debug, Clone)]
#[command(name = "check-service-certs")]
#[command(author, about, long_about = None, disable_version_flag = true)]
pub struct Cli {
    /// Specify alternate config file
    #[arg(short = 'c', long = "configfile")]
    pub configfile: Option<String>,

    /// Specify service to run check on
    #[arg(short = 's', long = "service")]
    pub service: Option<String>,

    /// Test mode. Check certs, but do not send notifications
    #[arg(short = 't', long = "test")]
    pub test: bool,

    /// Print version and build of check-service-certs and exit
    #[arg(long = "version")]
    pub version: bool,

    /// Verbose logging (set log level to debug)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Quiet logging (set log level to warn)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl Cli {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.verbose && self.quiet {
            anyhow::bail!("Cannot specify both --verbose and --quiet");
        }

        if matches!(self.service.as_deref(), Some(s) if s.trim().is_empty()) {
            anyhow::bail!("--service requires a non-empty service name");
        }

        Ok(())
    }

    /// Log level forced by flags, if any
    pub fn log_level_override(&self) -> Option<&'static str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            Some("warn")
        } else {
            None
        }
    }

    pub fn version_string() -> String {
        format!(
            "check-service-certs version {}, build {}",
            env!("CARGO_PKG_VERSION"),
            option_env!("BUILD_TIMESTAMP").unwrap_or("unknown")
        )
    }
}
