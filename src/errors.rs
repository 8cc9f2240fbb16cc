use std::error;
use std::fmt;
use std::io;

/// Errors that can occur while searching for the gateway.
#[derive(Debug)]
pub enum SearchError {
    /// The HTTP request for a device description document failed.
    HttpError(attohttpc::Error),
    /// IO error while exchanging SSDP messages.
    IoError(io::Error),
    /// No gateway advertised a WAN connection service before the
    /// search timeout elapsed.
    NoGatewayFound,
    /// A gateway answered the search but its description document does
    /// not advertise a matching WAN connection control service. Carries
    /// the description location that was queried.
    NoControlUrl(String),
    /// A device description document could not be parsed.
    XmlError(xmltree::ParseError),
    /// A URL received from the gateway could not be parsed or resolved.
    UrlError(url::ParseError),
}

impl From<io::Error> for SearchError {
    fn from(err: io::Error) -> SearchError {
        SearchError::IoError(err)
    }
}

impl From<attohttpc::Error> for SearchError {
    fn from(err: attohttpc::Error) -> SearchError {
        SearchError::HttpError(err)
    }
}

impl From<xmltree::ParseError> for SearchError {
    fn from(err: xmltree::ParseError) -> SearchError {
        SearchError::XmlError(err)
    }
}

impl From<url::ParseError> for SearchError {
    fn from(err: url::ParseError) -> SearchError {
        SearchError::UrlError(err)
    }
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SearchError::HttpError(e) => write!(f, "HTTP error: {}", e),
            SearchError::IoError(e) => write!(f, "IO error: {}", e),
            SearchError::NoGatewayFound => write!(f, "no UPnP gateway found"),
            SearchError::NoControlUrl(location) => {
                write!(f, "no control URL found for server: {}", location)
            }
            SearchError::XmlError(e) => write!(f, "invalid description document: {}", e),
            SearchError::UrlError(e) => write!(f, "invalid URL from gateway: {}", e),
        }
    }
}

impl error::Error for SearchError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            SearchError::HttpError(e) => Some(e),
            SearchError::IoError(e) => Some(e),
            SearchError::XmlError(e) => Some(e),
            SearchError::UrlError(e) => Some(e),
            SearchError::NoGatewayFound | SearchError::NoControlUrl(..) => None,
        }
    }
}

/// Errors that can occur when sending a SOAP request to the gateway.
#[derive(Debug)]
pub enum RequestError {
    /// The HTTP round trip to the control URL failed.
    HttpError(attohttpc::Error),
    /// IO error while talking to the gateway.
    IoError(io::Error),
    /// The response from the gateway could not be parsed.
    InvalidResponse(String),
    /// The gateway returned an unhandled SOAP error code and description.
    ErrorCode(u16, String),
}

impl From<io::Error> for RequestError {
    fn from(err: io::Error) -> RequestError {
        RequestError::IoError(err)
    }
}

impl From<attohttpc::Error> for RequestError {
    fn from(err: attohttpc::Error) -> RequestError {
        RequestError::HttpError(err)
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RequestError::HttpError(e) => write!(f, "HTTP error: {}", e),
            RequestError::IoError(e) => write!(f, "IO error: {}", e),
            RequestError::InvalidResponse(text) => {
                write!(f, "invalid response from gateway: {}", text)
            }
            RequestError::ErrorCode(code, description) => {
                write!(f, "gateway response error {}: {}", code, description)
            }
        }
    }
}

impl error::Error for RequestError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            RequestError::HttpError(e) => Some(e),
            RequestError::IoError(e) => Some(e),
            RequestError::InvalidResponse(..) | RequestError::ErrorCode(..) => None,
        }
    }
}

/// Errors returned by `Gateway::get_external_ip`.
#[derive(Debug)]
pub enum GetExternalIpError {
    /// The client is not authorized to perform the operation.
    ActionNotAuthorized,
    /// The gateway answered the action but reported no usable address.
    AddressUnavailable,
    /// Some other error occured performing the request.
    RequestError(RequestError),
}

impl From<RequestError> for GetExternalIpError {
    fn from(err: RequestError) -> GetExternalIpError {
        GetExternalIpError::RequestError(err)
    }
}

impl fmt::Display for GetExternalIpError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GetExternalIpError::ActionNotAuthorized => {
                write!(f, "the client is not authorized to query the external IP address")
            }
            GetExternalIpError::AddressUnavailable => {
                write!(f, "couldn't get external IP address")
            }
            GetExternalIpError::RequestError(e) => write!(f, "request error: {}", e),
        }
    }
}

impl error::Error for GetExternalIpError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            GetExternalIpError::RequestError(e) => Some(e),
            _ => None,
        }
    }
}

/// Failure of the combined search-then-query operation, tagged by the
/// stage that failed.
#[derive(Debug)]
pub enum Error {
    /// Discovery or description fetch failed.
    Search(SearchError),
    /// The external address query failed.
    GetExternalIp(GetExternalIpError),
}

impl From<SearchError> for Error {
    fn from(err: SearchError) -> Error {
        Error::Search(err)
    }
}

impl From<GetExternalIpError> for Error {
    fn from(err: GetExternalIpError) -> Error {
        Error::GetExternalIp(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Search(e) => write!(f, "gateway search failed: {}", e),
            Error::GetExternalIp(e) => write!(f, "external IP query failed: {}", e),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Search(e) => Some(e),
            Error::GetExternalIp(e) => Some(e),
        }
    }
}
