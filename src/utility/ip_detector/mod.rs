//! Public IP detection by racing "what is my IP" endpoints.
//!
//! Every configured endpoint is queried concurrently for one address
//! family. The first response whose body is an address of that family wins,
//! the remaining requests are cancelled through a broadcast channel, and
//! every spawned request is joined before the race returns. When nothing
//! succeeds the individual failures are folded into a [`errors::RaceError`]
//! that remembers whether every endpoint timed out.
//!
//! IPv4 and IPv6 can be raced side by side with
//! [`types::IpDetector::detect_both`]; the two races share no cancellation.
//!
//! The network side is the [`traits::IpFetcher`] trait. [`types::HttpFetcher`]
//! implements it with a reqwest client built per request, restricted to the
//! raced family and optionally bound to a local source address.

pub mod constants;
pub mod errors;
pub mod functions;
pub mod impls;
pub mod traits;
pub mod types;
