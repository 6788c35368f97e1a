//! Return routes that keep selected networks outside the tunnel

use anyhow::{Context, Result};
use std::process::Command;

/// The pre-VPN default route: gateway address and the interface it sits on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gateway {
    pub addr: String,
    pub iface: String,
}

/// Parse `ip route` output for the default route line,
/// e.g. `default via 172.17.0.1 dev eth0`.
pub fn parse_default_route(output: &str) -> Option<Gateway> {
    for line in output.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.first() != Some(&"default") {
            continue;
        }
        let addr = parts.iter().position(|p| *p == "via").map(|i| parts.get(i + 1))??;
        let iface = parts.iter().position(|p| *p == "dev").map(|i| parts.get(i + 1))??;
        return Some(Gateway {
            addr: addr.to_string(),
            iface: iface.to_string(),
        });
    }
    None
}

/// Discover the current default gateway via `ip route`.
pub fn default_gateway() -> Result<Option<Gateway>> {
    let output = Command::new("ip")
        .args(["route"])
        .output()
        .context("Failed to run ip route")?;
    if !output.status.success() {
        return Ok(None);
    }
    Ok(parse_default_route(&String::from_utf8_lossy(&output.stdout)))
}

/// Install one return route per network, directing its traffic via the
/// pre-VPN gateway so reply traffic is not captured by the tunnel's
/// redirect-gateway. Individual route failures are reported and skipped.
pub fn add_return_routes(networks: &[String]) -> Result<()> {
    let gateway = match default_gateway()? {
        Some(gw) => gw,
        None => {
            eprintln!("⚠ No default gateway found, skipping return routes");
            return Ok(());
        }
    };

    for network in networks {
        let output = Command::new("ip")
            .args(["route", "add", network, "via", &gateway.addr, "dev", &gateway.iface])
            .output()
            .context("Failed to run ip route add")?;
        if output.status.success() {
            println!(
                "✓ Return route added: {} via {} dev {}",
                network, gateway.addr, gateway.iface
            );
        } else {
            eprintln!(
                "⚠ Failed to add route {}: {}",
                network,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_route() {
        let out = "default via 172.17.0.1 dev eth0\n\
                   172.17.0.0/16 dev eth0 proto kernel scope link src 172.17.0.2\n";
        let gw = parse_default_route(out).unwrap();
        assert_eq!(gw.addr, "172.17.0.1");
        assert_eq!(gw.iface, "eth0");
    }

    #[test]
    fn test_parse_ignores_non_default_lines() {
        let out = "10.8.0.0/24 dev tun0 proto kernel scope link src 10.8.0.2\n";
        assert!(parse_default_route(out).is_none());
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(parse_default_route("").is_none());
    }

    #[test]
    fn test_parse_default_without_via() {
        // a link-scope default has no usable gateway address
        assert!(parse_default_route("default dev eth0 scope link\n").is_none());
    }
}
