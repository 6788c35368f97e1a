//! VPN configuration and credential file management

use anyhow::{bail, Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Mount point holding all VPN state files.
pub const VPN_DIR: &str = "/vpn";
pub const CONF_FILE: &str = "vpn.conf";
pub const AUTH_FILE: &str = "vpn.auth";
pub const CA_FILE: &str = "vpn-ca.crt";
pub const FIREWALL_MARKER: &str = ".firewall";

/// Parsed `-v "server;user;pass"` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpnSpec {
    pub server: String,
    pub user: String,
    pub pass: String,
}

impl VpnSpec {
    /// Split the semicolon-delimited triple into named fields. Exactly three
    /// non-empty fields are required.
    pub fn parse(raw: &str) -> Result<Self> {
        let fields: Vec<&str> = raw.split(';').collect();
        if fields.len() != 3 {
            bail!(
                "expected \"server;user;pass\" (3 fields), got {} field(s)",
                fields.len()
            );
        }
        if fields.iter().any(|f| f.is_empty()) {
            bail!("expected \"server;user;pass\", one or more fields are empty");
        }
        Ok(Self {
            server: fields[0].to_string(),
            user: fields[1].to_string(),
            pass: fields[2].to_string(),
        })
    }
}

/// Write the OpenVPN client configuration and the auth credential file under
/// `dir`, overwriting any previous files unconditionally.
pub fn write_vpn_config(dir: &Path, spec: &VpnSpec) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create VPN directory {}", dir.display()))?;

    let conf_path = dir.join(CONF_FILE);
    let auth_path = dir.join(AUTH_FILE);
    let ca_path = dir.join(CA_FILE);

    let conf = format!(
        "client\n\
         dev tun\n\
         proto udp\n\
         remote {server} 1194\n\
         resolv-retry infinite\n\
         nobind\n\
         persist-key\n\
         persist-tun\n\
         tls-client\n\
         remote-cert-tls server\n\
         ca {ca}\n\
         auth-user-pass {auth}\n\
         comp-lzo\n\
         reneg-sec 0\n\
         verb 1\n\
         redirect-gateway def1\n",
        server = spec.server,
        ca = ca_path.display(),
        auth = auth_path.display(),
    );
    fs::write(&conf_path, conf)
        .with_context(|| format!("Failed to write {}", conf_path.display()))?;

    let mut auth_file = fs::File::create(&auth_path)
        .with_context(|| format!("Failed to create {}", auth_path.display()))?;
    writeln!(auth_file, "{}", spec.user)?;
    writeln!(auth_file, "{}", spec.pass)?;

    // Credentials are readable by the owner only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&auth_path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(&auth_path, perms)?;
    }

    println!("✓ VPN configuration written for {}", spec.server);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_valid_triple() {
        let spec = VpnSpec::parse("vpn.example.com;alice;s3cret").unwrap();
        assert_eq!(spec.server, "vpn.example.com");
        assert_eq!(spec.user, "alice");
        assert_eq!(spec.pass, "s3cret");
    }

    #[test]
    fn test_parse_rejects_wrong_field_count() {
        assert!(VpnSpec::parse("vpn.example.com;alice").is_err());
        assert!(VpnSpec::parse("a;b;c;d").is_err());
        assert!(VpnSpec::parse("vpn.example.com").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_fields() {
        assert!(VpnSpec::parse("vpn.example.com;;s3cret").is_err());
        assert!(VpnSpec::parse(";alice;s3cret").is_err());
    }

    #[test]
    fn test_config_has_exactly_one_remote_line() {
        let dir = tempdir().unwrap();
        let spec = VpnSpec::parse("vpn.example.com;alice;s3cret").unwrap();
        write_vpn_config(dir.path(), &spec).unwrap();

        let conf = fs::read_to_string(dir.path().join(CONF_FILE)).unwrap();
        let remotes: Vec<&str> = conf
            .lines()
            .filter(|l| l.starts_with("remote "))
            .collect();
        assert_eq!(remotes, vec!["remote vpn.example.com 1194"]);
        assert!(conf.contains("proto udp"));
        assert!(conf.contains("tls-client"));
        assert!(conf.contains("reneg-sec 0"));
        assert!(conf.contains("redirect-gateway def1"));
    }

    #[test]
    fn test_auth_file_two_lines_owner_only() {
        let dir = tempdir().unwrap();
        let spec = VpnSpec::parse("vpn.example.com;alice;s3cret").unwrap();
        write_vpn_config(dir.path(), &spec).unwrap();

        let auth_path = dir.path().join(AUTH_FILE);
        let auth = fs::read_to_string(&auth_path).unwrap();
        assert_eq!(auth.lines().collect::<Vec<_>>(), vec!["alice", "s3cret"]);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&auth_path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_rewrite_overwrites_previous_config() {
        let dir = tempdir().unwrap();
        let first = VpnSpec::parse("old.example.com;u;p").unwrap();
        let second = VpnSpec::parse("new.example.com;u;p").unwrap();
        write_vpn_config(dir.path(), &first).unwrap();
        write_vpn_config(dir.path(), &second).unwrap();

        let conf = fs::read_to_string(dir.path().join(CONF_FILE)).unwrap();
        assert!(conf.contains("remote new.example.com 1194"));
        assert!(!conf.contains("old.example.com"));
    }
}
