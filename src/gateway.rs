use std::fmt;
use std::time::Duration;

use url::Url;

use crate::common::{messages, parsing};
use crate::errors::GetExternalIpError;
use crate::soap;

/// A gateway found by the search functions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gateway {
    /// Control URL of the WAN connection service.
    pub control_url: Url,
    /// The advertised service type, used as the SOAP namespace and in
    /// the SOAPAction header.
    pub service_type: String,
    /// Timeout applied to each SOAP round trip.
    pub http_timeout: Duration,
}

impl Gateway {
    fn perform_request(&self, action: &str, body: &str, ok: &str) -> parsing::RequestResult {
        let header = messages::format_soap_action(&self.service_type, action);
        let text = soap::send(&self.control_url, soap::Action::new(&header), body, self.http_timeout)?;
        parsing::parse_response(text, ok)
    }

    /// Ask the gateway for its external IP address.
    ///
    /// The returned value is whatever the gateway reported, trimmed but
    /// otherwise unvalidated; callers treat it as an opaque address
    /// string.
    pub fn get_external_ip(&self) -> Result<String, GetExternalIpError> {
        let body = messages::format_get_external_ip_message(&self.service_type);
        let result = self.perform_request(
            messages::GET_EXTERNAL_IP_ACTION,
            &body,
            "GetExternalIPAddressResponse",
        );
        parsing::parse_get_external_ip_response(result)
    }
}

impl fmt::Display for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.control_url)
    }
}
