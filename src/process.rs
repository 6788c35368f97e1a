//! Process detection and image replacement

use anyhow::{Context, Result};
use std::convert::Infallible;
use std::ffi::CString;
use std::process::Command;

/// Find a process ID by full-command-line pattern, pgrep style.
pub fn find_process_by_pattern(pattern: &str) -> Result<Option<u32>> {
    let output = Command::new("pgrep")
        .args(["-f", pattern])
        .output()
        .context("Failed to run pgrep")?;

    if output.status.success() {
        let pid_str = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if let Some(first) = pid_str.lines().next() {
            if let Ok(pid) = first.trim().parse::<u32>() {
                return Ok(Some(pid));
            }
        }
    }
    Ok(None)
}

/// Replace the current process image with `program`, resolved on PATH.
/// Only returns on failure.
pub fn exec(program: &str, args: &[String]) -> Result<Infallible> {
    let prog = CString::new(program).context("Program name contains a NUL byte")?;
    let mut argv = vec![prog.clone()];
    for arg in args {
        argv.push(CString::new(arg.as_str()).context("Argument contains a NUL byte")?);
    }
    nix::unistd::execvp(&prog, &argv).with_context(|| format!("Failed to exec {}", program))
}
