//! Fail-closed firewall for the container's OUTPUT chain
//!
//! Installed before OpenVPN connects so that a downed tunnel never leaks
//! traffic: everything is dropped except the tunnel interfaces, loopback,
//! DNS, the private return range, and traffic owned by the `vpn` group
//! (which lets the OpenVPN process itself reach the remote endpoint).

use crate::config::FIREWALL_MARKER;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use std::process::Command;

/// Group the OpenVPN process runs under; its traffic bypasses the drop rule.
pub const VPN_GROUP: &str = "vpn";

/// The OUTPUT-chain allow-list, in install order. Built as data so the rule
/// set is inspectable without invoking iptables.
pub fn allow_rules() -> Vec<Vec<&'static str>> {
    vec![
        vec!["-m", "state", "--state", "RELATED,ESTABLISHED", "-j", "ACCEPT"],
        vec!["-o", "lo", "-j", "ACCEPT"],
        vec!["-o", "tun0", "-j", "ACCEPT"],
        vec!["-o", "tap0", "-j", "ACCEPT"],
        vec!["-d", "192.168.0.0/16", "-j", "ACCEPT"],
        vec!["-p", "udp", "--dport", "53", "-j", "ACCEPT"],
        vec!["-m", "owner", "--gid-owner", VPN_GROUP, "-j", "ACCEPT"],
    ]
}

/// Reset the OUTPUT chain and install the allow-list, then touch the marker
/// file so the rules are re-applied on every container restart. Safe to call
/// repeatedly: the chain is flushed before rules are appended.
pub fn apply(dir: &Path) -> Result<()> {
    run_iptables(&["-F", "OUTPUT"])?;
    run_iptables(&["-P", "OUTPUT", "DROP"])?;
    for rule in allow_rules() {
        let mut args = vec!["-A", "OUTPUT"];
        args.extend(rule);
        run_iptables(&args)?;
    }
    touch_marker(dir)?;
    println!("✓ Firewall applied (OUTPUT locked to VPN traffic)");
    Ok(())
}

/// Whether a previous run requested the firewall.
pub fn marker_present(dir: &Path) -> bool {
    dir.join(FIREWALL_MARKER).exists()
}

pub fn touch_marker(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    let marker = dir.join(FIREWALL_MARKER);
    fs::File::create(&marker)
        .with_context(|| format!("Failed to create {}", marker.display()))?;
    Ok(())
}

// A half-applied fail-closed rule set must not pass silently
fn run_iptables(args: &[&str]) -> Result<()> {
    let output = Command::new("iptables")
        .args(args)
        .output()
        .context("Failed to run iptables")?;
    if !output.status.success() {
        bail!(
            "iptables {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}
