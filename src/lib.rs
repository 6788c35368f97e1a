// OpenVPN Container Entrypoint Library
// Configures and launches an OpenVPN client inside a container: writes the
// client config and credentials, applies optional DNS/firewall/route/timezone
// policy, then hands the process over to a user command or OpenVPN itself.

pub mod cli;
pub mod config;
pub mod dns;
pub mod fetch;
pub mod firewall;
pub mod launch;
pub mod process;
pub mod routes;
pub mod timezone;
