//! OpenVPN Container Entrypoint
//! Writes the VPN config and credentials, applies optional DNS, firewall,
//! route, and timezone policy, then execs a replacement command or OpenVPN.

use anyhow::Result;
use openvpn_entrypoint::{cli, config, dns, fetch, firewall, launch, routes, timezone};
use std::path::Path;

fn main() -> Result<()> {
    let opts = cli::parse_or_exit();
    run(&opts)
}

fn run(opts: &cli::Options) -> Result<()> {
    let vpn_dir = Path::new(config::VPN_DIR);

    if let Some(spec) = &opts.vpn {
        config::write_vpn_config(vpn_dir, spec)?;
    }

    if let Some(url) = &opts.fetch_url {
        fetch::fetch_config(vpn_dir, url)?;
    }

    // Once requested, the firewall is re-applied on every restart
    if opts.firewall || firewall::marker_present(vpn_dir) {
        firewall::apply(vpn_dir)?;
    }

    if !opts.routes.is_empty() {
        routes::add_return_routes(&opts.routes)?;
    }

    if let Some(zone) = &opts.timezone {
        timezone::set(zone)?;
    }

    if opts.dns {
        dns::enable(&vpn_dir.join(config::CONF_FILE))?;
    }

    launch::dispatch(vpn_dir, opts)
}
