// Standard library
use std::net::IpAddr;

// 3rd party crates
use if_addrs::Interface;
use nix::net::if_::if_nametoindex;
use tracing::debug;

// Project imports
use crate::utility::ip_detector::types::{BindAddresses, FamilyBind, IpVersion};

// Current module imports
use super::errors::BindError;
use super::types::BindTarget;

fn parse_literal(raw: &str) -> Option<IpAddr> {
    if let Ok(ip) = raw.parse::<IpAddr>() {
        return Some(ip);
    }

    // Bracketed literals are only meaningful for IPv6.
    raw.strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .and_then(|inner| inner.parse::<IpAddr>().ok())
        .filter(|ip| ip.is_ipv6())
}

/// Classifies a user supplied bind target.
///
/// Address literals (IPv6 optionally in brackets) pin the family; anything
/// else is taken to be an interface name.
pub fn classify(raw: &str) -> BindTarget {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return BindTarget::default();
    }

    match parse_literal(trimmed) {
        Some(ip) => BindTarget {
            ip_version: Some(IpVersion::of(&ip)),
            is_interface: false,
            raw: trimmed.to_string(),
        },
        None => BindTarget {
            ip_version: None,
            is_interface: true,
            raw: trimmed.to_string(),
        },
    }
}

/// Whether the kernel knows an interface called `name`, with or without
/// addresses.
pub fn interface_exists(name: &str) -> bool {
    if_nametoindex(name).is_ok()
}

/// First address of `ip_version` among the `(interface, address)` pairs
/// belonging to the existing interface `name`.
///
/// Address listings skip interfaces without addresses, so an absent name
/// here means the interface has no address of any family.
pub fn select_interface_address<'a>(
    addresses: impl IntoIterator<Item = (&'a str, IpAddr)>,
    name: &str,
    ip_version: IpVersion,
) -> Result<IpAddr, BindError> {
    addresses
        .into_iter()
        .filter(|(iface, _)| *iface == name)
        .map(|(_, ip)| ip)
        .find(|ip| ip_version.matches(ip))
        .ok_or_else(|| BindError::NoAddressForFamily {
            interface: name.to_string(),
            ip_version,
        })
}

/// Looks up the address of `ip_version` assigned to interface `name`.
pub fn resolve_interface_address(name: &str, ip_version: IpVersion) -> Result<IpAddr, BindError> {
    if !interface_exists(name) {
        return Err(BindError::NoSuchInterface(name.to_string()));
    }

    let interfaces: Vec<Interface> = if_addrs::get_if_addrs()?;
    let ip = select_interface_address(
        interfaces.iter().map(|iface| (iface.name.as_str(), iface.ip())),
        name,
        ip_version,
    )?;
    debug!("Interface {} resolved to {} address {}", name, ip_version, ip);
    Ok(ip)
}

/// Source address for a race of `ip_version`, or `None` when no bind target
/// was given.
pub fn resolve_bind(target: &BindTarget, ip_version: IpVersion) -> Result<Option<IpAddr>, BindError> {
    if target.raw.is_empty() {
        return Ok(None);
    }

    if target.is_interface {
        return resolve_interface_address(&target.raw, ip_version).map(Some);
    }

    parse_literal(&target.raw)
        .map(Some)
        .ok_or_else(|| BindError::InvalidAddress(target.raw.clone()))
}

/// Turns one family's bind resolution into its race source.
///
/// An interface lacking the family only fails that family; every other bind
/// error still aborts.
pub fn family_bind(resolved: Result<Option<IpAddr>, BindError>) -> Result<FamilyBind, BindError> {
    match resolved {
        Ok(Some(ip)) => Ok(FamilyBind::Address(ip)),
        Ok(None) => Ok(FamilyBind::Any),
        Err(e @ BindError::NoAddressForFamily { .. }) => {
            debug!("{}", e);
            Ok(FamilyBind::Unavailable(e.to_string()))
        }
        Err(e) => Err(e),
    }
}

/// Source addresses for both families of an unpinned race.
pub fn resolve_bind_pair(target: &BindTarget) -> Result<BindAddresses, BindError> {
    Ok(BindAddresses {
        v4: family_bind(resolve_bind(target, IpVersion::V4))?,
        v6: family_bind(resolve_bind(target, IpVersion::V6))?,
    })
}
