//! End-to-end tests against an in-process mock gateway: a UDP thread
//! that answers the SSDP search and a TCP thread that serves the device
//! description and the SOAP control endpoint.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, UdpSocket};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use wanip::{SearchError, SearchOptions};

const WAN_IP_SERVICE: &str = "urn:schemas-upnp-org:service:WANIPConnection:1";
const WAN_PPP_SERVICE: &str = "urn:schemas-upnp-org:service:WANPPPConnection:1";

/// Answer the first search request with the given SSDP datagrams.
fn spawn_ssdp_responder(replies: Vec<String>) -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = socket.local_addr().unwrap();
    thread::spawn(move || {
        let mut buf = [0u8; 2048];
        let (read, from) = socket.recv_from(&mut buf).unwrap();
        let request = std::str::from_utf8(&buf[..read]).unwrap();
        assert!(request.starts_with("M-SEARCH * HTTP/1.1\r\n"));
        assert!(request.contains("MAN: \"ssdp:discover\"\r\n"));
        assert!(request.ends_with("\r\n\r\n"));
        for reply in replies {
            socket.send_to(reply.as_bytes(), from).unwrap();
        }
    });
    addr
}

/// A responder that hears the search but never answers.
fn spawn_silent_responder() -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = socket.local_addr().unwrap();
    thread::spawn(move || {
        let mut buf = [0u8; 2048];
        let _ = socket.recv_from(&mut buf);
    });
    addr
}

/// Serve the description document on GET and the SOAP body on POST.
/// Every POST request is forwarded on the channel for inspection.
fn spawn_http_server(descriptor: String, soap_body: String) -> (SocketAddr, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let mut stream = match stream {
                Ok(stream) => stream,
                Err(..) => break,
            };
            let request = read_request(&mut stream);
            let body = if request.starts_with("POST") {
                tx.send(request).unwrap();
                &soap_body
            } else {
                &descriptor
            };
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
        }
    });
    (addr, rx)
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 1024];
    let header_end = loop {
        let read = stream.read(&mut buf).unwrap();
        assert!(read > 0, "connection closed mid-request");
        data.extend_from_slice(&buf[..read]);
        if let Some(pos) = find_header_end(&data) {
            break pos;
        }
    };
    let content_length = content_length(&data[..header_end]);
    while data.len() < header_end + content_length {
        let read = stream.read(&mut buf).unwrap();
        assert!(read > 0, "connection closed mid-body");
        data.extend_from_slice(&buf[..read]);
    }
    String::from_utf8(data).unwrap()
}

fn find_header_end(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|w| w == b"\r\n\r\n").map(|pos| pos + 4)
}

fn content_length(head: &[u8]) -> usize {
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();
    head.lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0)
}

fn ssdp_reply(service_type: &str, location: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nCACHE-CONTROL: max-age=120\r\nST: {}\r\nUSN: uuid:mock::{}\r\nLOCATION: {}\r\n\r\n",
        service_type, service_type, location
    )
}

fn descriptor(services: &[(&str, &str)]) -> String {
    let services: String = services
        .iter()
        .map(|(service_type, control_url)| {
            format!(
                "<service><serviceType>{}</serviceType><controlURL>{}</controlURL></service>",
                service_type, control_url
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <device>
    <deviceType>urn:schemas-upnp-org:device:InternetGatewayDevice:1</deviceType>
    <serviceList>{}</serviceList>
  </device>
</root>"#,
        services
    )
}

fn soap_ip_response(address: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
<s:Body>
    <u:GetExternalIPAddressResponse xmlns:u="{}">
        <NewExternalIPAddress>{}</NewExternalIPAddress>
    </u:GetExternalIPAddressResponse>
</s:Body>
</s:Envelope>"#,
        WAN_IP_SERVICE, address
    )
}

fn options(responder: SocketAddr) -> SearchOptions {
    SearchOptions {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        broadcast_address: responder,
        timeout: Some(Duration::from_millis(1500)),
        http_timeout: Duration::from_secs(1),
    }
}

#[test]
fn external_ip_end_to_end() {
    let (http_addr, posts) = spawn_http_server(
        descriptor(&[(WAN_IP_SERVICE, "/ctl/IPConn")]),
        soap_ip_response("198.51.100.9"),
    );
    let location = format!("http://{}/rootDesc.xml", http_addr);
    let responder = spawn_ssdp_responder(vec![ssdp_reply(WAN_IP_SERVICE, &location)]);

    let ip = wanip::external_ip(options(responder)).unwrap();
    assert_eq!(ip, "198.51.100.9");

    let post = posts.recv_timeout(Duration::from_secs(1)).unwrap();
    let lower = post.to_ascii_lowercase();
    assert!(post.starts_with("POST /ctl/IPConn "));
    assert!(lower.contains(&format!("soapaction: \"{}#getexternalipaddress\"", WAN_IP_SERVICE).to_ascii_lowercase()));
    assert!(lower.contains("content-type: text/xml; charset=\"utf-8\""));
    assert!(post.contains(&format!("<u:GetExternalIPAddress xmlns:u=\"{}\">", WAN_IP_SERVICE)));
}

#[test]
fn search_times_out_with_no_candidates() {
    let responder = spawn_silent_responder();
    let mut options = options(responder);
    options.timeout = Some(Duration::from_millis(250));

    match wanip::search_gateway(options) {
        Err(SearchError::NoGatewayFound) => (),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn descriptor_without_matching_service_fails() {
    let (http_addr, _posts) = spawn_http_server(
        descriptor(&[("urn:schemas-upnp-org:service:Layer3Forwarding:1", "/ctl/L3F")]),
        String::new(),
    );
    let location = format!("http://{}/rootDesc.xml", http_addr);
    let responder = spawn_ssdp_responder(vec![ssdp_reply(WAN_IP_SERVICE, &location)]);

    match wanip::search_gateway(options(responder)) {
        Err(SearchError::NoControlUrl(reported)) => assert_eq!(reported, location),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn prefers_wan_ip_over_wan_ppp() {
    let (http_addr, _posts) = spawn_http_server(
        descriptor(&[(WAN_PPP_SERVICE, "/ctl/PPPConn"), (WAN_IP_SERVICE, "/ctl/IPConn")]),
        String::new(),
    );
    let location = format!("http://{}/rootDesc.xml", http_addr);
    // PPP answers first; the IP endpoint must still win.
    let responder = spawn_ssdp_responder(vec![
        ssdp_reply(WAN_PPP_SERVICE, &location),
        ssdp_reply(WAN_IP_SERVICE, &location),
    ]);

    let gateway = wanip::search_gateway(options(responder)).unwrap();
    assert_eq!(gateway.service_type, WAN_IP_SERVICE);
    assert_eq!(gateway.control_url.path(), "/ctl/IPConn");
}
