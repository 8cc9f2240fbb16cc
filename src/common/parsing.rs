use std::io;

use url::Url;
use xmltree::Element;

use crate::errors::{GetExternalIpError, RequestError};

/// Which WAN connection service flavour an endpoint advertises.
/// `WANIPConnection` is preferred over `WANPPPConnection` when both are
/// present on the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WanKind {
    Ip,
    Ppp,
}

/// One candidate gateway extracted from a single SSDP response datagram.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    /// Value of the `Location` header, the device description URL.
    pub location: Url,
    /// Value of the `ST` header, verbatim.
    pub service_type: String,
    pub kind: WanKind,
}

/// Classify an `ST` header value. Matches anything ending in
/// `WAN(IP|PPP)Connection:<digits>`, case-insensitively.
pub fn classify_service_type(service_type: &str) -> Option<WanKind> {
    let lower = service_type.to_ascii_lowercase();
    for (needle, kind) in &[("wanipconnection:", WanKind::Ip), ("wanpppconnection:", WanKind::Ppp)] {
        if let Some(pos) = lower.rfind(needle) {
            let version = &lower[pos + needle.len()..];
            if !version.is_empty() && version.bytes().all(|b| b.is_ascii_digit()) {
                return Some(*kind);
            }
        }
    }
    None
}

/// Parse one SSDP response datagram. Returns an endpoint only when the
/// datagram carries both a WAN connection `ST` header and a `Location`
/// header with a parseable URL. Header names match case-insensitively,
/// line by line, with surrounding whitespace tolerated.
pub fn parse_search_result(text: &str) -> Option<Endpoint> {
    let mut service_type = None;
    let mut location = None;

    for line in text.lines() {
        let line = line.trim();
        let colon = match line.find(':') {
            Some(colon) => colon,
            None => continue,
        };
        let (name, value) = (line[..colon].trim(), line[colon + 1..].trim());
        if name.eq_ignore_ascii_case("st") {
            if let Some(kind) = classify_service_type(value) {
                service_type = Some((value.to_string(), kind));
            }
        } else if name.eq_ignore_ascii_case("location") {
            location = Url::parse(value).ok();
        }
    }

    match (service_type, location) {
        (Some((service_type, kind)), Some(location)) => Some(Endpoint {
            location,
            service_type,
            kind,
        }),
        _ => None,
    }
}

/// Control endpoint data extracted from a device description document.
#[derive(Debug, Clone, PartialEq)]
pub struct DescribedService {
    /// Text of the `URLBase` element, if the document has one.
    pub url_base: Option<String>,
    /// Text of the matching service's `controlURL` element, possibly
    /// relative.
    pub control_url: String,
}

/// Parse a device description document and find the control URL of the
/// first `<service>` whose `<serviceType>` equals `service_type`
/// exactly. Services are visited in document order, wherever they are
/// nested; gateways commonly bury the WAN connection service two device
/// levels deep. Returns `Ok(None)` when the document parses but
/// advertises no matching service.
pub fn parse_descriptor<R>(body: R, service_type: &str) -> Result<Option<DescribedService>, xmltree::ParseError>
where
    R: io::Read,
{
    let root = Element::parse(body)?;
    let url_base = root
        .get_child("URLBase")
        .and_then(|e| e.get_text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let control_url = match find_control_url(&root, service_type) {
        Some(control_url) => control_url,
        None => return Ok(None),
    };

    Ok(Some(DescribedService { url_base, control_url }))
}

fn find_control_url(element: &Element, service_type: &str) -> Option<String> {
    for node in &element.children {
        let child = match node.as_element() {
            Some(child) => child,
            None => continue,
        };
        if child.name == "service" {
            let matches = child
                .get_child("serviceType")
                .and_then(|e| e.get_text())
                .map(|t| t.trim() == service_type)
                .unwrap_or(false);
            if matches {
                if let Some(text) = child.get_child("controlURL").and_then(|e| e.get_text()) {
                    return Some(text.trim().to_string());
                }
            }
        }
        if let Some(control_url) = find_control_url(child, service_type) {
            return Some(control_url);
        }
    }
    None
}

/// Resolve a control URL against the document's `URLBase`, falling back
/// to the scheme/host/port of the description location when the
/// document has none. Relative references resolve against the base,
/// absolute ones pass through unchanged.
pub fn resolve_control_url(
    location: &Url,
    url_base: Option<&str>,
    control_url: &str,
) -> Result<Url, url::ParseError> {
    let base = match url_base {
        Some(raw) => Url::parse(raw.trim())?,
        None => {
            let mut base = location.clone();
            base.set_path("/");
            base.set_query(None);
            base.set_fragment(None);
            base
        }
    };
    base.join(control_url.trim())
}

pub struct RequestResponse {
    pub text: String,
    pub xml: Element,
}

pub type RequestResult = Result<RequestResponse, RequestError>;

/// Decode a SOAP response envelope. Returns the `ok` element when the
/// action succeeded, or translates a `Fault`/`UPnPError` body into
/// `RequestError::ErrorCode`.
pub fn parse_response(text: String, ok: &str) -> RequestResult {
    let mut xml = match Element::parse(text.as_bytes()) {
        Ok(xml) => xml,
        Err(..) => return Err(RequestError::InvalidResponse(text)),
    };
    let body = match xml.get_mut_child("Body") {
        Some(body) => body,
        None => return Err(RequestError::InvalidResponse(text)),
    };
    if let Some(ok) = body.take_child(ok) {
        return Ok(RequestResponse { text, xml: ok });
    }
    let upnp_error = match body
        .get_child("Fault")
        .and_then(|e| e.get_child("detail"))
        .and_then(|e| e.get_child("UPnPError"))
    {
        Some(upnp_error) => upnp_error,
        None => return Err(RequestError::InvalidResponse(text)),
    };

    match (
        upnp_error.get_child("errorCode").and_then(|e| e.get_text()),
        upnp_error.get_child("errorDescription").and_then(|e| e.get_text()),
    ) {
        (Some(code), Some(description)) => match code.trim().parse::<u16>() {
            Ok(code) => Err(RequestError::ErrorCode(code, description.into_owned())),
            Err(..) => Err(RequestError::InvalidResponse(text)),
        },
        _ => Err(RequestError::InvalidResponse(text)),
    }
}

/// Extract the external address out of a `GetExternalIPAddressResponse`.
/// The value is returned as an opaque trimmed string; a missing tag or a
/// blank value is `AddressUnavailable`. Fault code 606 means the gateway
/// refused the action.
pub fn parse_get_external_ip_response(result: RequestResult) -> Result<String, GetExternalIpError> {
    match result {
        Ok(resp) => match resp
            .xml
            .get_child("NewExternalIPAddress")
            .and_then(|e| e.get_text())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
        {
            Some(address) => Ok(address),
            None => Err(GetExternalIpError::AddressUnavailable),
        },
        Err(RequestError::ErrorCode(606, _)) => Err(GetExternalIpError::ActionNotAuthorized),
        Err(e) => Err(GetExternalIpError::RequestError(e)),
    }
}

#[test]
fn test_parse_search_result_ok() {
    let text = "HTTP/1.1 200 OK\r\n\
                ST: urn:schemas-upnp-org:service:WANIPConnection:1\r\n\
                Location: http://192.168.0.1:5000/rootDesc.xml\r\n\r\n";
    let endpoint = parse_search_result(text).unwrap();
    assert_eq!(endpoint.service_type, "urn:schemas-upnp-org:service:WANIPConnection:1");
    assert_eq!(endpoint.location.as_str(), "http://192.168.0.1:5000/rootDesc.xml");
    assert_eq!(endpoint.kind, WanKind::Ip);
}

#[test]
fn test_parse_search_result_case_insensitivity() {
    let text = "http/1.1 200 ok\r\n\
                st:  URN:SCHEMAS-UPNP-ORG:SERVICE:WANPPPCONNECTION:2  \r\n\
                LOCATION:http://10.0.0.138/desc\r\n\r\n";
    let endpoint = parse_search_result(text).unwrap();
    assert_eq!(endpoint.service_type, "URN:SCHEMAS-UPNP-ORG:SERVICE:WANPPPCONNECTION:2");
    assert_eq!(endpoint.kind, WanKind::Ppp);
}

#[test]
fn test_parse_search_result_rejects_other_services() {
    let text = "HTTP/1.1 200 OK\r\n\
                ST: urn:schemas-upnp-org:service:Layer3Forwarding:1\r\n\
                Location: http://192.168.0.1:5000/rootDesc.xml\r\n\r\n";
    assert!(parse_search_result(text).is_none());
}

#[test]
fn test_parse_search_result_requires_location() {
    let text = "HTTP/1.1 200 OK\r\n\
                ST: urn:schemas-upnp-org:service:WANIPConnection:1\r\n\r\n";
    assert!(parse_search_result(text).is_none());
}

#[test]
fn test_classify_service_type() {
    assert_eq!(
        classify_service_type("urn:schemas-upnp-org:service:WANIPConnection:1"),
        Some(WanKind::Ip)
    );
    assert_eq!(
        classify_service_type("urn:schemas-upnp-org:service:WANPPPConnection:12"),
        Some(WanKind::Ppp)
    );
    // version suffix must be all digits
    assert_eq!(classify_service_type("urn:x:WANIPConnection:1a"), None);
    assert_eq!(classify_service_type("urn:x:WANIPConnection:"), None);
    assert_eq!(classify_service_type("urn:schemas-upnp-org:service:WANCommonInterfaceConfig:1"), None);
}

#[cfg(test)]
const DESCRIPTOR: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
   <URLBase>http://10.0.0.1:1234</URLBase>
   <device>
      <deviceType>urn:schemas-upnp-org:device:InternetGatewayDevice:1</deviceType>
      <serviceList>
         <service>
            <serviceType>urn:schemas-upnp-org:service:Layer3Forwarding:1</serviceType>
            <controlURL>/ctl/L3F</controlURL>
         </service>
      </serviceList>
      <deviceList>
         <device>
            <deviceType>urn:schemas-upnp-org:device:WANDevice:1</deviceType>
            <deviceList>
               <device>
                  <deviceType>urn:schemas-upnp-org:device:WANConnectionDevice:1</deviceType>
                  <serviceList>
                     <service>
                        <serviceType>urn:schemas-upnp-org:service:WANIPConnection:1</serviceType>
                        <controlURL>/ctl/IPConn</controlURL>
                     </service>
                  </serviceList>
               </device>
            </deviceList>
         </device>
      </deviceList>
   </device>
</root>"#;

#[test]
fn test_parse_descriptor_nested_service() {
    let service = parse_descriptor(DESCRIPTOR.as_bytes(), "urn:schemas-upnp-org:service:WANIPConnection:1")
        .unwrap()
        .unwrap();
    assert_eq!(service.url_base.as_deref(), Some("http://10.0.0.1:1234"));
    assert_eq!(service.control_url, "/ctl/IPConn");
}

#[test]
fn test_parse_descriptor_no_matching_service() {
    let result = parse_descriptor(DESCRIPTOR.as_bytes(), "urn:schemas-upnp-org:service:WANPPPConnection:1");
    assert_eq!(result.unwrap(), None);
}

#[test]
fn test_resolve_control_url_with_url_base() {
    let location = Url::parse("http://192.168.0.1:5000/rootDesc.xml").unwrap();
    let resolved = resolve_control_url(&location, Some("http://10.0.0.1:1234"), "/ctl/IPConn").unwrap();
    assert_eq!(resolved.as_str(), "http://10.0.0.1:1234/ctl/IPConn");
}

#[test]
fn test_resolve_control_url_without_url_base() {
    let location = Url::parse("http://192.168.0.1:5000/rootDesc.xml").unwrap();
    let resolved = resolve_control_url(&location, None, "/ctl/IPConn").unwrap();
    assert_eq!(resolved.as_str(), "http://192.168.0.1:5000/ctl/IPConn");
}

#[test]
fn test_resolve_control_url_absolute_passthrough() {
    let location = Url::parse("http://192.168.0.1:5000/rootDesc.xml").unwrap();
    let resolved = resolve_control_url(&location, Some("http://10.0.0.1:1234"), "http://10.0.0.2/ctl").unwrap();
    assert_eq!(resolved.as_str(), "http://10.0.0.2/ctl");
}

#[cfg(test)]
fn soap_response(inner: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
<s:Body>
    <u:GetExternalIPAddressResponse xmlns:u="urn:schemas-upnp-org:service:WANIPConnection:1">
        {}
    </u:GetExternalIPAddressResponse>
</s:Body>
</s:Envelope>"#,
        inner
    )
}

#[test]
fn test_parse_get_external_ip_response_ok() {
    let text = soap_response("<NewExternalIPAddress> 203.0.113.7 </NewExternalIPAddress>");
    let result = parse_response(text, "GetExternalIPAddressResponse");
    assert_eq!(parse_get_external_ip_response(result).unwrap(), "203.0.113.7");
}

#[test]
fn test_parse_get_external_ip_response_empty_address() {
    let text = soap_response("<NewExternalIPAddress></NewExternalIPAddress>");
    let result = parse_response(text, "GetExternalIPAddressResponse");
    match parse_get_external_ip_response(result) {
        Err(GetExternalIpError::AddressUnavailable) => (),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_parse_get_external_ip_response_missing_tag() {
    let text = soap_response("");
    let result = parse_response(text, "GetExternalIPAddressResponse");
    match parse_get_external_ip_response(result) {
        Err(GetExternalIpError::AddressUnavailable) => (),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_parse_response_fault() {
    let text = r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
<s:Body>
    <s:Fault>
        <faultcode>s:Client</faultcode>
        <detail>
            <UPnPError xmlns="urn:schemas-upnp-org:control-1-0">
                <errorCode>606</errorCode>
                <errorDescription>Action not authorized</errorDescription>
            </UPnPError>
        </detail>
    </s:Fault>
</s:Body>
</s:Envelope>"#;
    let result = parse_response(text.to_string(), "GetExternalIPAddressResponse");
    match parse_get_external_ip_response(result) {
        Err(GetExternalIpError::ActionNotAuthorized) => (),
        other => panic!("unexpected result: {:?}", other),
    }
}
