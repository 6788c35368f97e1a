//! Download an externally hosted OpenVPN config

use crate::config::CONF_FILE;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Fetch a configuration file from `url` into `dir` unless one is already
/// present. A previously provisioned config is never overwritten. Download
/// errors are reported but not fatal; the missing file is caught again at
/// launch time.
pub fn fetch_config(dir: &Path, url: &str) -> Result<()> {
    let conf_path = dir.join(CONF_FILE);
    if conf_path.exists() {
        println!(
            "Config already present at {}, skipping download",
            conf_path.display()
        );
        return Ok(());
    }

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create VPN directory {}", dir.display()))?;

    println!("Downloading VPN config from: {}", url);

    // Config servers in the field routinely carry self-signed certificates
    let client = reqwest::blocking::Client::builder()
        .danger_accept_invalid_certs(true)
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")?;

    let response = match client.get(url).send() {
        Ok(resp) => resp,
        Err(e) => {
            eprintln!("⚠ Failed to download config: {}", e);
            return Ok(());
        }
    };

    if !response.status().is_success() {
        eprintln!("⚠ Failed to download config: HTTP {}", response.status());
        return Ok(());
    }

    let body = response.bytes().context("Failed to read config body")?;
    fs::write(&conf_path, &body)
        .with_context(|| format!("Failed to write {}", conf_path.display()))?;

    println!("✓ Config downloaded to {}", conf_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_existing_config_is_never_overwritten() {
        let dir = tempdir().unwrap();
        let conf_path = dir.path().join(CONF_FILE);
        fs::write(&conf_path, "remote keep.example.com 1194\n").unwrap();

        // URL is never contacted when a config already exists
        fetch_config(dir.path(), "https://127.0.0.1:1/client.ovpn").unwrap();

        let conf = fs::read_to_string(&conf_path).unwrap();
        assert_eq!(conf, "remote keep.example.com 1194\n");
    }

    #[test]
    fn test_unreachable_url_is_not_fatal() {
        let dir = tempdir().unwrap();
        fetch_config(dir.path(), "https://127.0.0.1:1/client.ovpn").unwrap();
        assert!(!dir.path().join(CONF_FILE).exists());
    }
}
