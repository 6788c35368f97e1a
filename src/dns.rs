//! Resolver handoff to the VPN's nameservers
//!
//! Rather than rewriting resolv.conf in-process, the config gains up/down
//! hooks so OpenVPN swaps the resolver in for exactly the tunnel's lifetime.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

const UPDATE_SCRIPT: &str = "/etc/openvpn/update-resolv-conf";

/// Append the resolver-update hook directives to the config file.
pub fn enable(conf_path: &Path) -> Result<()> {
    let mut conf = OpenOptions::new()
        .create(true)
        .append(true)
        .open(conf_path)
        .with_context(|| format!("Failed to open {}", conf_path.display()))?;

    writeln!(conf, "script-security 2")?;
    writeln!(conf, "up {}", UPDATE_SCRIPT)?;
    writeln!(conf, "down {}", UPDATE_SCRIPT)?;

    println!("✓ DNS rewrite hooks enabled");
    Ok(())
}
