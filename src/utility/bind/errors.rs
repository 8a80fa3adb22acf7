// Standard library
use std::io;

// 3rd party crates
use thiserror::Error;

// Project imports
use crate::utility::ip_detector::types::IpVersion;

#[derive(Debug, Error)]
pub enum BindError {
    #[error("no such network interface: {0}")]
    NoSuchInterface(String),

    #[error("interface {interface} does not have an {ip_version} address")]
    NoAddressForFamily {
        interface: String,
        ip_version: IpVersion,
    },

    #[error("failed to list network interfaces: {0}")]
    InterfaceLookup(#[from] io::Error),

    #[error("invalid bind address: {0}")]
    InvalidAddress(String),
}
