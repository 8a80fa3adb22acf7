//! Classification and resolution of the local bind target: an address
//! literal or the name of a network interface.

pub mod errors;
pub mod functions;
pub mod types;
