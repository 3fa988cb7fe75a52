use falcon::http::parser::{
    ParseError, content_length, header_value, parse_request, parse_request_line,
};
use falcon::http::reader::{RequestHead, find_boundary};
use falcon::http::request::Method;

fn head(raw: &'static [u8]) -> RequestHead {
    let (header_len, body_start) = find_boundary(raw).unwrap();
    RequestHead {
        buf: bytes::Bytes::from_static(raw),
        header_len,
        body_start,
    }
}

#[test]
fn test_parse_simple_get_request() {
    let req = parse_request(&head(b"GET / HTTP/1.0\r\nHost: example.com\r\n\r\n"), 511).unwrap();

    assert_eq!(req.method, Method::GET);
    assert_eq!(req.raw_target, "/");
    assert_eq!(req.header("Host"), Some(&b"example.com"[..]));
    assert_eq!(req.declared_length, None);
}

#[test]
fn test_parse_put_request_with_body_prefix() {
    let req = parse_request(
        &head(b"PUT /upload/a.txt HTTP/1.0\r\nContent-Length: 5\r\n\r\nhel"),
        511,
    )
    .unwrap();

    assert_eq!(req.method, Method::PUT);
    assert_eq!(req.raw_target, "/upload/a.txt");
    assert_eq!(req.declared_length, Some(5));
    assert_eq!(&req.body_prefix[..], b"hel");
}

#[test]
fn test_parse_lf_only_request() {
    let req = parse_request(&head(b"POST /exec HTTP/1.0\nContent-Length: 2\n\nls"), 511).unwrap();

    assert_eq!(req.method, Method::POST);
    assert_eq!(req.declared_length, Some(2));
    assert_eq!(&req.body_prefix[..], b"ls");
}

#[test]
fn test_parse_methods_case_insensitive() {
    let cases = [
        ("get", Method::GET),
        ("Put", Method::PUT),
        ("POST", Method::POST),
        ("DELETE", Method::Other("DELETE".to_string())),
    ];

    for (token, expected) in cases {
        let line = format!("{token} / HTTP/1.0");
        let (method, _) = parse_request_line(line.as_bytes(), 511).unwrap();
        assert_eq!(method, expected);
    }
}

#[test]
fn test_parse_long_method_is_cut_and_unknown() {
    let (method, target) = parse_request_line(b"GETTINGLONG /x HTTP/1.0", 511).unwrap();

    assert_eq!(method, Method::Other("GETTING".to_string()));
    assert_eq!(target, "/x");
}

#[test]
fn test_parse_missing_target() {
    assert_eq!(
        parse_request_line(b"GET", 511),
        Err(ParseError::MalformedRequestLine)
    );
    assert_eq!(
        parse_request_line(b"", 511),
        Err(ParseError::MalformedRequestLine)
    );
}

#[test]
fn test_parse_tokens_only_from_first_line() {
    // The target must not be borrowed from the next header line.
    assert_eq!(
        parse_request_line(b"GET\r\nHost: example.com", 511),
        Err(ParseError::MalformedRequestLine)
    );
}

#[test]
fn test_parse_skips_leading_blank_lines() {
    let (method, target) = parse_request_line(b"\r\n \tGET /x HTTP/1.0\r\nHost: y", 511).unwrap();

    assert_eq!(method, Method::GET);
    assert_eq!(target, "/x");
}

#[test]
fn test_parse_target_too_long() {
    let line = format!("GET /{} HTTP/1.0", "a".repeat(600));

    assert_eq!(
        parse_request_line(line.as_bytes(), 511),
        Err(ParseError::TargetTooLong { len: 601, max: 511 })
    );
}

#[test]
fn test_parse_version_is_optional() {
    let (method, target) = parse_request_line(b"GET /docs/", 511).unwrap();

    assert_eq!(method, Method::GET);
    assert_eq!(target, "/docs/");
}

#[test]
fn test_header_lookup_is_case_insensitive() {
    let block = b"PUT /x HTTP/1.0\r\ncontent-length:\t 12\r\nX-Other: y";

    assert_eq!(header_value(block, "Content-Length"), Some(&b"12"[..]));
    assert_eq!(header_value(block, "x-other"), Some(&b"y"[..]));
    assert_eq!(header_value(block, "Missing"), None);
}

#[test]
fn test_header_lookup_requires_colon_after_name() {
    let block = b"PUT /x HTTP/1.0\r\nContent-Length-Extra: 3\r\nContent-Length : 4";

    assert_eq!(header_value(block, "Content-Length"), None);
}

#[test]
fn test_content_length_values() {
    let cases: [(&[u8], Option<u64>); 8] = [
        (b"GET / HTTP/1.0\r\nContent-Length: 42", Some(42)),
        (b"GET / HTTP/1.0\r\nContent-Length: 0", Some(0)),
        (b"GET / HTTP/1.0\r\nContent-Length: 17abc", Some(17)),
        (b"GET / HTTP/1.0\r\nContent-Length: -5", None),
        (b"GET / HTTP/1.0\r\nContent-Length: abc", None),
        (b"GET / HTTP/1.0\r\nContent-Length: ", None),
        (b"GET / HTTP/1.0\r\nContent-Length: 99999999999999999999999", None),
        (b"GET / HTTP/1.0\r\nHost: x", None),
    ];

    for (block, expected) in cases {
        assert_eq!(
            content_length(block),
            expected,
            "{}",
            String::from_utf8_lossy(block)
        );
    }
}

#[test]
fn test_zero_length_is_not_missing() {
    let zero = content_length(b"POST /exec HTTP/1.0\r\nContent-Length: 0");
    let missing = content_length(b"POST /exec HTTP/1.0");

    assert_eq!(zero, Some(0));
    assert_eq!(missing, None);
    assert_ne!(zero, missing);
}
