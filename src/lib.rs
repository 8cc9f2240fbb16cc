//! Discover the local NAT router's external IP address via UPnP.
//!
//! The crate performs the three-step dance an Internet Gateway Device
//! expects: an SSDP multicast search for a WAN connection service, an
//! HTTP fetch of the device description document to locate the service's
//! control URL, and a SOAP `GetExternalIPAddress` action against it.
//!
//! Everything is synchronous and self-contained; each call owns its
//! sockets and no state persists between calls.
//!
//! ```no_run
//! use wanip::SearchOptions;
//!
//! fn main() {
//!     match wanip::external_ip(SearchOptions::default()) {
//!         Ok(ip) => println!("external IP address: {}", ip),
//!         Err(err) => println!("error: {}", err),
//!     }
//! }
//! ```

pub use crate::common::SearchOptions;
pub use crate::errors::{Error, GetExternalIpError, RequestError, SearchError};
pub use crate::gateway::Gateway;
pub use crate::search::search_gateway;

mod common;
mod errors;
mod gateway;
mod search;
mod soap;

/// Find the gateway and ask it for its external IP address in one call.
///
/// Convenience wrapper over [`search_gateway`] and
/// [`Gateway::get_external_ip`]; the error tells which stage failed.
pub fn external_ip(options: SearchOptions) -> Result<String, Error> {
    let gateway = search_gateway(options)?;
    Ok(gateway.get_external_ip()?)
}
