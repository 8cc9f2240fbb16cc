/// Content of the SSDP search request. CRLF line endings and the
/// blank-line terminator are mandatory.
pub const SEARCH_REQUEST: &str = "M-SEARCH * HTTP/1.1\r\n\
HOST: 239.255.255.250:1900\r\n\
MAN: \"ssdp:discover\"\r\n\
MX: 5\r\n\
ST: ssdp:all\r\n\
\r\n";

pub const GET_EXTERNAL_IP_ACTION: &str = "GetExternalIPAddress";

/// Value of the SOAPAction header. The enclosing quotes are part of the
/// header value.
pub fn format_soap_action(service_type: &str, action: &str) -> String {
    format!("\"{}#{}\"", service_type, action)
}

pub fn format_get_external_ip_message(service_type: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
<s:Body>
    <u:GetExternalIPAddress xmlns:u="{}">
    </u:GetExternalIPAddress>
</s:Body>
</s:Envelope>"#,
        service_type
    )
}
