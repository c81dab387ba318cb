//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Every backend operation is a JSON `POST`, so a request is just a URL, a
//! header list, and a body. `ApiClient::build_request` produces these values
//! and `ApiClient::parse_response` consumes `HttpResponse` values; the
//! `Transport` in between is the only piece that touches the network.
//!
//! All fields use owned types (`String`, `Vec`) so values can be handed to
//! any transport, including test doubles that record them.

/// An outbound `POST` described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
///
/// Constructed by the transport after executing an `HttpRequest`, then passed
/// to `ApiClient::parse_response` for envelope decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
