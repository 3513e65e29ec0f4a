//! # stackctl Network Utilities (`common::network`)
//!
//! File: cli/src/common/network/mod.rs
//!
//! ## Overview
//!
//! Port checks for `stackctl doctor`. The reverse proxy needs 80 and 443, so
//! doctor looks at the host's listening TCP sockets (`ss -ltn`) and reports
//! which of the wanted ports are already taken.
//!
use crate::common::process;
use crate::core::error::Result;
use std::collections::BTreeSet;

/// Ports the stack's reverse proxy binds on the host.
pub const PROXY_PORTS: [u16; 2] = [80, 443];

/// Extracts listening ports from `ss -ltn` output.
///
/// The fourth column is `Local Address:Port`; IPv6 addresses (`[::]:443`)
/// and wildcards (`*:80`) are handled by splitting on the last colon.
pub fn parse_listening_ports(ss_output: &str) -> BTreeSet<u16> {
    ss_output
        .lines()
        .skip_while(|line| !line.trim_start().starts_with("State"))
        .skip(1)
        .filter_map(|line| line.split_whitespace().nth(3))
        .filter_map(|local| local.rsplit_once(':'))
        .filter_map(|(_, port)| port.parse().ok())
        .collect()
}

/// Returns the subset of `wanted` already bound on the host.
pub async fn ports_in_use(wanted: &[u16]) -> Result<Vec<u16>> {
    let out = process::run_capture("ss", &["-ltn".to_string()]).await?;
    let listening = parse_listening_ports(&out);
    Ok(wanted.iter().copied().filter(|p| listening.contains(p)).collect())
}
