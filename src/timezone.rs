//! Container timezone configuration

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::process::Command;

pub const DEFAULT_TZ: &str = "EST5EDT";
const ZONEINFO_DIR: &str = "/usr/share/zoneinfo";
const ETC_DIR: &str = "/etc";

/// Set the system timezone. Invalid zone names are reported and leave the
/// current configuration untouched; a zone matching the current one is a
/// no-op.
pub fn set(zone: &str) -> Result<()> {
    set_with_roots(zone, Path::new(ZONEINFO_DIR), Path::new(ETC_DIR))
}

/// Zone switch against explicit zoneinfo/etc roots.
pub fn set_with_roots(zone: &str, zoneinfo: &Path, etc: &Path) -> Result<()> {
    let zone_path = zoneinfo.join(zone);
    if !zone_path.exists() {
        eprintln!("⚠ Invalid timezone: {} (no such zoneinfo entry)", zone);
        return Ok(());
    }

    let tz_file = etc.join("timezone");
    let current = fs::read_to_string(&tz_file).unwrap_or_default();
    if current.trim() == zone {
        println!("Timezone already set to {}", zone);
        return Ok(());
    }

    fs::write(&tz_file, format!("{}\n", zone))
        .with_context(|| format!("Failed to write {}", tz_file.display()))?;

    let localtime = etc.join("localtime");
    if localtime.symlink_metadata().is_ok() {
        fs::remove_file(&localtime)
            .with_context(|| format!("Failed to remove {}", localtime.display()))?;
    }
    #[cfg(unix)]
    std::os::unix::fs::symlink(&zone_path, &localtime)
        .with_context(|| format!("Failed to link {}", localtime.display()))?;

    // Refresh the packaged tzdata state; absence of dpkg is not an error here
    match Command::new("dpkg-reconfigure")
        .args(["-f", "noninteractive", "tzdata"])
        .output()
    {
        Ok(output) if !output.status.success() => {
            eprintln!(
                "⚠ dpkg-reconfigure tzdata failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Err(e) => eprintln!("⚠ Could not run dpkg-reconfigure: {}", e),
        _ => {}
    }

    println!("✓ Timezone set to {}", zone);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fixture() -> (tempfile::TempDir, tempfile::TempDir) {
        let zoneinfo = tempdir().unwrap();
        let etc = tempdir().unwrap();
        fs::create_dir_all(zoneinfo.path().join("America")).unwrap();
        fs::write(zoneinfo.path().join("America/New_York"), b"TZif2").unwrap();
        fs::write(zoneinfo.path().join("EST5EDT"), b"TZif2").unwrap();
        (zoneinfo, etc)
    }

    #[test]
    fn test_invalid_zone_leaves_state_untouched() {
        let (zoneinfo, etc) = fixture();
        fs::write(etc.path().join("timezone"), "EST5EDT\n").unwrap();

        set_with_roots("Atlantis/Lost_City", zoneinfo.path(), etc.path()).unwrap();

        let tz = fs::read_to_string(etc.path().join("timezone")).unwrap();
        assert_eq!(tz, "EST5EDT\n");
        assert!(etc.path().join("localtime").symlink_metadata().is_err());
    }

    #[test]
    fn test_valid_zone_updates_file_and_symlink() {
        let (zoneinfo, etc) = fixture();

        set_with_roots("America/New_York", zoneinfo.path(), etc.path()).unwrap();

        let tz = fs::read_to_string(etc.path().join("timezone")).unwrap();
        assert_eq!(tz, "America/New_York\n");
        let target = fs::read_link(etc.path().join("localtime")).unwrap();
        assert_eq!(target, zoneinfo.path().join("America/New_York"));
    }

    #[test]
    fn test_same_zone_is_noop() {
        let (zoneinfo, etc) = fixture();
        fs::write(etc.path().join("timezone"), "America/New_York\n").unwrap();

        set_with_roots("America/New_York", zoneinfo.path(), etc.path()).unwrap();

        // no symlink is created when nothing changes
        assert!(etc.path().join("localtime").symlink_metadata().is_err());
    }

    #[test]
    fn test_switch_replaces_existing_symlink() {
        let (zoneinfo, etc) = fixture();
        set_with_roots("EST5EDT", zoneinfo.path(), etc.path()).unwrap();
        set_with_roots("America/New_York", zoneinfo.path(), etc.path()).unwrap();

        let target = fs::read_link(etc.path().join("localtime")).unwrap();
        assert_eq!(target, zoneinfo.path().join("America/New_York"));
    }
}
