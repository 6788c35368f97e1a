//! Final dispatch: replacement command, restart detection, or OpenVPN

use crate::cli::Options;
use crate::config::{CA_FILE, CONF_FILE};
use crate::firewall::VPN_GROUP;
use crate::process;
use anyhow::{Context, Result};
use regex::Regex;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::thread;
use std::time::Duration;

/// How long to keep the container alive (and its logs readable) after a
/// fatal precondition before falling through.
const PRECONDITION_STALL: Duration = Duration::from_secs(120);

/// Exit status when the replacement command cannot be found on PATH.
pub const EXIT_CMD_NOT_FOUND: i32 = 13;

/// Append `redirect-gateway def1` when return routes were requested but the
/// config carries no redirect directive of its own. Returns whether the
/// directive was appended.
pub fn ensure_redirect_gateway(conf_path: &Path) -> Result<bool> {
    let conf = fs::read_to_string(conf_path)
        .with_context(|| format!("Failed to read {}", conf_path.display()))?;
    let present = Regex::new(r"(?m)^\s*redirect-gateway\b")
        .unwrap()
        .is_match(&conf);
    if present {
        return Ok(false);
    }
    let mut file = OpenOptions::new().append(true).open(conf_path)?;
    writeln!(file, "redirect-gateway def1")?;
    Ok(true)
}

/// The warning emitted (followed by a stall) when no config exists at
/// dispatch time. None when the config is in place.
pub fn missing_config_warning(conf_path: &Path) -> Option<String> {
    if conf_path.exists() {
        return None;
    }
    Some(format!(
        "⚠ No VPN configuration found at {}; pausing before launch",
        conf_path.display()
    ))
}

/// A CA must be present as a file next to the config or embedded as an
/// inline `<ca>` block inside it.
pub fn certificate_available(dir: &Path) -> bool {
    if dir.join(CA_FILE).exists() {
        return true;
    }
    fs::read_to_string(dir.join(CONF_FILE))
        .map(|conf| conf.contains("<ca>"))
        .unwrap_or(false)
}

/// Terminal dispatch. Execs the replacement command or OpenVPN and does not
/// return on success; returns Ok(()) only when an OpenVPN instance is
/// already running.
pub fn dispatch(dir: &Path, opts: &Options) -> Result<()> {
    // Branch 1/2: a replacement command bypasses VPN launch entirely
    if let Some((cmd, rest)) = opts.command.split_first() {
        match which::which(cmd) {
            Ok(resolved) => {
                process::exec(&resolved.to_string_lossy(), rest)?;
            }
            Err(_) => {
                eprintln!("{}: command not found", cmd);
                std::process::exit(EXIT_CMD_NOT_FOUND);
            }
        }
    }

    let conf_path = dir.join(CONF_FILE);

    // Branch 3: best-effort restart avoidance. The pattern cannot match this
    // entrypoint's own argv, so no self-exclusion dance is needed.
    let pattern = format!("openvpn.*{}", conf_path.display());
    if let Some(pid) = process::find_process_by_pattern(&pattern)? {
        println!("OpenVPN already running (PID: {}), nothing to do", pid);
        return Ok(());
    }

    if let Some(warning) = missing_config_warning(&conf_path) {
        eprintln!("{}", warning);
        thread::sleep(PRECONDITION_STALL);
    }

    if !opts.routes.is_empty() && conf_path.exists() && ensure_redirect_gateway(&conf_path)? {
        println!("✓ redirect-gateway appended to config");
    }

    if !certificate_available(dir) {
        eprintln!(
            "⚠ No CA certificate at {} and no <ca> block in config; pausing before launch",
            dir.join(CA_FILE).display()
        );
        thread::sleep(PRECONDITION_STALL);
    }

    // Run OpenVPN under the restricted group so the firewall's group-owner
    // rule lets its pre-tunnel traffic out
    if let Ok(Some(group)) = nix::unistd::Group::from_name(VPN_GROUP) {
        if let Err(e) = nix::unistd::setgid(group.gid) {
            eprintln!("⚠ Could not switch to group {}: {}", VPN_GROUP, e);
        }
    }

    println!("Starting OpenVPN...");
    process::exec(
        "openvpn",
        &["--config".to_string(), conf_path.display().to_string()],
    )?;
    Ok(())
}
