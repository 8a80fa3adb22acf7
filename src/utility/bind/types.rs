// Project imports
use crate::utility::ip_detector::types::IpVersion;

/// What the user asked outgoing requests to originate from.
///
/// `ip_version` is `None` for an empty target and for interface names; an
/// interface is probed for an address of each family as it is raced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BindTarget {
    pub ip_version: Option<IpVersion>,
    pub is_interface: bool,
    pub raw: String,
}
