//! Command-line interface and the immutable run options derived from it

use crate::config::VpnSpec;
use crate::timezone::DEFAULT_TZ;
use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::env;

#[derive(Parser, Debug)]
#[command(name = "entrypoint")]
#[command(about = "OpenVPN client container entrypoint")]
pub struct Cli {
    /// Rewrite the resolver to the VPN's nameservers for the tunnel lifetime
    #[arg(short = 'd')]
    pub dns: bool,

    /// Fetch a config from URL if none is present yet
    #[arg(short = 'e', value_name = "URL")]
    pub external_url: Option<String>,

    /// Apply the fail-closed firewall before connecting
    #[arg(short = 'f')]
    pub firewall: bool,

    /// Space-delimited CIDR networks to route outside the tunnel
    #[arg(short = 'r', value_name = "NETWORK")]
    pub route: Option<String>,

    /// Set the timezone (defaults to TZ env or EST5EDT when no zone given)
    #[arg(short = 't', value_name = "TIMEZONE", num_args = 0..=1, default_missing_value = "")]
    pub timezone: Option<String>,

    /// Write config and credentials from "server;user;pass"
    #[arg(short = 'v', value_name = "SERVER;USER;PASS")]
    pub vpn: Option<String>,

    /// Replacement command to exec instead of launching OpenVPN
    #[arg(trailing_var_arg = true)]
    pub command: Vec<String>,
}

/// Everything the run needs, fixed after parsing.
#[derive(Debug)]
pub struct Options {
    pub dns: bool,
    pub firewall: bool,
    pub fetch_url: Option<String>,
    pub routes: Vec<String>,
    pub timezone: Option<String>,
    pub vpn: Option<VpnSpec>,
    pub command: Vec<String>,
}

impl Options {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let vpn = cli.vpn.as_deref().map(VpnSpec::parse).transpose()?;
        let routes = cli
            .route
            .as_deref()
            .map(|r| r.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let timezone = cli
            .timezone
            .map(|zone| resolve_timezone(&zone, env::var("TZ").ok().as_deref()));
        Ok(Self {
            dns: cli.dns,
            firewall: cli.firewall,
            fetch_url: cli.external_url,
            routes,
            timezone,
            vpn,
            command: cli.command,
        })
    }
}

/// `-t` without a zone means "whatever TZ says", falling back to the
/// conventional default.
pub fn resolve_timezone(raw: &str, env_tz: Option<&str>) -> String {
    if !raw.is_empty() {
        return raw.to_string();
    }
    match env_tz {
        Some(tz) if !tz.is_empty() => tz.to_string(),
        _ => DEFAULT_TZ.to_string(),
    }
}

/// Map clap's error kinds onto the documented exit statuses: help exits 0,
/// an unknown option exits 1, a missing or malformed option value exits 2.
pub fn usage_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        ErrorKind::UnknownArgument => 1,
        _ => 2,
    }
}

/// Parse the process arguments, terminating with the documented exit codes
/// on usage errors.
pub fn parse_or_exit() -> Options {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = usage_exit_code(err.kind());
            let _ = err.print();
            std::process::exit(code);
        }
    };
    match Options::from_cli(cli) {
        Ok(opts) => opts,
        Err(err) => {
            eprintln!("error: {}", err);
            eprintln!("{}", Cli::command().render_usage());
            std::process::exit(2);
        }
    }
}
