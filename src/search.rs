use std::io;
use std::net::UdpSocket;
use std::str;
use std::time::Duration;

use log::{debug, warn};

use crate::common::parsing::{self, Endpoint, WanKind};
use crate::common::{messages, SearchOptions};
use crate::errors::SearchError;
use crate::gateway::Gateway;

const MAX_RESPONSE_SIZE: usize = 2048;

/// Search for a gateway with the provided options.
///
/// Broadcasts an SSDP search, collects WAN connection endpoints until a
/// `WANIPConnection` service answers or the receive timeout elapses,
/// then fetches device descriptions until one yields a control URL.
pub fn search_gateway(options: SearchOptions) -> Result<Gateway, SearchError> {
    let socket = UdpSocket::bind(options.bind_addr)?;
    socket.set_multicast_ttl_v4(2)?;
    socket.set_read_timeout(options.timeout)?;

    debug!("sending search request to: {}", options.broadcast_address);
    socket.send_to(messages::SEARCH_REQUEST.as_bytes(), options.broadcast_address)?;

    let mut endpoints = collect_endpoints(&socket)?;
    // WANIPConnection endpoints first, stable within each kind.
    endpoints.sort_by_key(|endpoint| endpoint.kind != WanKind::Ip);

    let mut last_err = None;
    for endpoint in &endpoints {
        match fetch_gateway(endpoint, options.http_timeout) {
            Ok(gateway) => {
                debug!("using control URL: {}", gateway.control_url);
                return Ok(gateway);
            }
            Err(err) => {
                warn!("no usable service at {}: {}", endpoint.location, err);
                last_err = Some(err);
            }
        }
    }
    // collect_endpoints never returns an empty list, so last_err is set.
    Err(last_err.unwrap_or(SearchError::NoGatewayFound))
}

/// Listen for SSDP responses until a `WANIPConnection` endpoint shows up
/// or the socket's read timeout fires. SSDP is best-effort multicast:
/// answers may be duplicated, out of order, or junk, so unusable
/// datagrams are skipped rather than treated as fatal.
fn collect_endpoints(socket: &UdpSocket) -> Result<Vec<Endpoint>, SearchError> {
    let mut endpoints: Vec<Endpoint> = Vec::new();
    let mut buf = [0u8; MAX_RESPONSE_SIZE];

    loop {
        let (read, from) = match socket.recv_from(&mut buf) {
            Ok(result) => result,
            Err(err) if is_timeout(&err) => break,
            Err(err) => return Err(err.into()),
        };
        let text = match str::from_utf8(&buf[..read]) {
            Ok(text) => text,
            Err(..) => {
                debug!("skipping non-UTF-8 datagram from: {}", from);
                continue;
            }
        };
        if let Some(endpoint) = parsing::parse_search_result(text) {
            if endpoints.contains(&endpoint) {
                debug!("dropping duplicate response from: {}", from);
                continue;
            }
            debug!("received {} from: {}", endpoint.service_type, from);
            let found_ip = endpoint.kind == WanKind::Ip;
            endpoints.push(endpoint);
            if found_ip {
                break;
            }
        }
    }

    if endpoints.is_empty() {
        Err(SearchError::NoGatewayFound)
    } else {
        Ok(endpoints)
    }
}

fn is_timeout(err: &io::Error) -> bool {
    // WouldBlock on unix, TimedOut on windows
    matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

/// Fetch an endpoint's device description and resolve the control URL
/// of the service it advertised.
fn fetch_gateway(endpoint: &Endpoint, http_timeout: Duration) -> Result<Gateway, SearchError> {
    debug!("requesting device description from: {}", endpoint.location);
    let response = attohttpc::get(endpoint.location.as_str())
        .timeout(http_timeout)
        .send()?;
    let body = response.bytes()?;

    let service = parsing::parse_descriptor(&body[..], &endpoint.service_type)?
        .ok_or_else(|| SearchError::NoControlUrl(endpoint.location.to_string()))?;
    let control_url =
        parsing::resolve_control_url(&endpoint.location, service.url_base.as_deref(), &service.control_url)?;

    Ok(Gateway {
        control_url,
        service_type: endpoint.service_type.clone(),
        http_timeout,
    })
}
