use tokio::fs::File;

/// Value of the `Server` header on every response.
pub const SERVER_NAME: &str = "falcon-fm";

/// HTTP status codes the service answers with.
///
/// - `Ok` (200): listing, download, delete, command output
/// - `Created` (201): upload stored
/// - `BadRequest` (400): malformed request line, invalid path or length
/// - `NotFound` (404): no such regular file, or no such route
/// - `MethodNotAllowed` (405): method is not GET, PUT or POST
/// - `InternalServerError` (500): filesystem or subprocess failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 201 Created
    Created,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use falcon::http::response::StatusCode;
    /// assert_eq!(StatusCode::Created.as_u16(), 201);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::Created => 201,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Returns the standard reason phrase.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

/// Where the response body comes from.
#[derive(Debug)]
pub enum Body {
    Bytes(Vec<u8>),
    /// An open file streamed in chunks. `len` is committed in the header
    /// before the first chunk is read.
    File { file: File, len: u64 },
}

impl Body {
    pub fn len(&self) -> u64 {
        match self {
            Body::Bytes(bytes) => bytes.len() as u64,
            Body::File { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A response whose length is known before anything is sent.
///
/// Headers keep insertion order. The framing set (`Server`,
/// `Content-Type`, `Content-Length`, `Connection`) always comes first.
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Body,
}

/// Builder for responses.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .content_type("text/html; charset=utf-8")
///     .body(page.into_bytes())
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    content_type: Option<String>,
    extra: Vec<(String, String)>,
    body: Body,
}

impl ResponseBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            content_type: None,
            extra: Vec::new(),
            body: Body::Bytes(Vec::new()),
        }
    }

    pub fn content_type(mut self, value: impl Into<String>) -> Self {
        self.content_type = Some(value.into());
        self
    }

    /// Appends a header after the framing set. Names are not deduplicated.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Body::Bytes(body);
        self
    }

    pub fn file(mut self, file: File, len: u64) -> Self {
        self.body = Body::File { file, len };
        self
    }

    pub fn build(self) -> Response {
        let content_type = self.content_type.unwrap_or_else(|| match self.body {
            Body::Bytes(_) => "text/plain".to_string(),
            Body::File { .. } => "application/octet-stream".to_string(),
        });

        let mut headers = vec![
            ("Server".to_string(), SERVER_NAME.to_string()),
            ("Content-Type".to_string(), content_type),
            ("Content-Length".to_string(), self.body.len().to_string()),
            ("Connection".to_string(), "close".to_string()),
        ];
        headers.extend(self.extra);

        Response {
            status: self.status,
            headers,
            body: self.body,
        }
    }
}

impl Response {
    /// A `text/plain` response with a short message body.
    pub fn text(status: StatusCode, message: impl Into<Vec<u8>>) -> Self {
        ResponseBuilder::new(status).body(message.into()).build()
    }

    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::text(StatusCode::Ok, body)
    }

    pub fn html(page: String) -> Self {
        ResponseBuilder::new(StatusCode::Ok)
            .content_type("text/html; charset=utf-8")
            .body(page.into_bytes())
            .build()
    }

    pub fn bad_request(message: &str) -> Self {
        Self::text(StatusCode::BadRequest, message)
    }

    pub fn not_found() -> Self {
        Self::text(StatusCode::NotFound, "Not Found\n")
    }

    pub fn method_not_allowed() -> Self {
        Self::text(StatusCode::MethodNotAllowed, "Method Not Allowed\n")
    }

    pub fn internal_error() -> Self {
        Self::text(StatusCode::InternalServerError, "Internal Server Error\n")
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_length(&self) -> u64 {
        self.body.len()
    }
}
