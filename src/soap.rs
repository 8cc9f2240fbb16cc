use std::time::Duration;

use log::debug;
use url::Url;

use crate::errors::RequestError;

const HEADER_NAME: &str = "SOAPAction";

/// Value of the SOAPAction header, quotes included.
#[derive(Clone, Debug)]
pub struct Action(String);

impl Action {
    pub fn new(action: &str) -> Action {
        Action(action.into())
    }
}

/// Send one blocking SOAP request and return the response body.
pub fn send(url: &Url, action: Action, body: &str, timeout: Duration) -> Result<String, RequestError> {
    debug!("sending SOAP action {} to: {}", action.0, url);
    let response = attohttpc::post(url.as_str())
        .timeout(timeout)
        .header(HEADER_NAME, action.0.as_str())
        .header("Content-Type", "text/xml; charset=\"utf-8\"")
        .text(body)
        .send()?;
    Ok(response.text()?)
}
