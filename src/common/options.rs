use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Gateway search configuration.
///
/// `SearchOptions::default()` is appropriate for most situations. The
/// field defaults replace what used to be module-level globals in
/// earlier incarnations of this tool.
///
/// It can be created manually:
/// ```
/// use std::time::Duration;
/// use wanip::SearchOptions;
///
/// let options = SearchOptions {
///     timeout: Some(Duration::from_secs(5)),
///     ..Default::default()
/// };
/// ```
pub struct SearchOptions {
    /// Local address to bind the SSDP socket to. Defaults to `0.0.0.0:0`.
    pub bind_addr: SocketAddr,
    /// Address to send the search request to. Defaults to the well-known
    /// SSDP multicast group, `239.255.255.250:1900`.
    pub broadcast_address: SocketAddr,
    /// Receive timeout for SSDP responses; also the upper bound on the
    /// whole discovery stage. Defaults to 10 seconds.
    pub timeout: Option<Duration>,
    /// Timeout applied to each HTTP exchange with the gateway, both the
    /// description fetch and the SOAP action. Defaults to 10 seconds.
    pub http_timeout: Duration,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            broadcast_address: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(239, 255, 255, 250)), 1900),
            timeout: Some(Duration::from_secs(10)),
            http_timeout: Duration::from_secs(10),
        }
    }
}
