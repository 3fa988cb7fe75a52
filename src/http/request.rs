use bytes::Bytes;

use crate::http::parser;

/// Request methods the router understands.
///
/// Matching is case-insensitive. Anything else is kept verbatim in
/// [`Method::Other`] and answered with 405 Method Not Allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - listing, download and delete
    GET,
    /// PUT - upload
    PUT,
    /// POST - command execution
    POST,
    Other(String),
}

impl Method {
    /// Parses a request-line method token.
    ///
    /// # Example
    ///
    /// ```
    /// # use falcon::http::request::Method;
    /// assert_eq!(Method::from_token("GET"), Method::GET);
    /// assert_eq!(Method::from_token("put"), Method::PUT);
    /// assert_eq!(Method::from_token("DELETE"), Method::Other("DELETE".into()));
    /// ```
    pub fn from_token(token: &str) -> Self {
        if token.eq_ignore_ascii_case("GET") {
            Method::GET
        } else if token.eq_ignore_ascii_case("PUT") {
            Method::PUT
        } else if token.eq_ignore_ascii_case("POST") {
            Method::POST
        } else {
            Method::Other(token.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::PUT => "PUT",
            Method::POST => "POST",
            Method::Other(token) => token,
        }
    }
}

/// A parsed request head.
///
/// The body is not part of the request: `body_prefix` holds the body bytes
/// that arrived together with the head, the rest is still on the socket.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Request-target exactly as sent, query string included.
    pub raw_target: String,
    /// Everything before the header boundary, request line included.
    pub header_block: Bytes,
    pub body_prefix: Bytes,
    /// Valid `Content-Length`, if one was sent. `Some(0)` is a real, empty
    /// body and is not the same as a missing header.
    pub declared_length: Option<u64>,
}

impl Request {
    /// The target without its query string or fragment.
    pub fn path(&self) -> &str {
        let end = self
            .raw_target
            .find(['?', '#'])
            .unwrap_or(self.raw_target.len());
        &self.raw_target[..end]
    }

    /// Looks a header up by name, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        parser::header_value(&self.header_block, name)
    }
}
