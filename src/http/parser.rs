use crate::http::reader::RequestHead;
use crate::http::request::{Method, Request};

/// Method tokens longer than this are cut; they can then only be unknown.
pub const MAX_METHOD_LEN: usize = 7;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("request line needs a method and a target")]
    MalformedRequestLine,

    #[error("request target is {len} bytes, limit is {max}")]
    TargetTooLong { len: usize, max: usize },
}

/// Builds a [`Request`] from a head returned by the reader.
pub fn parse_request(head: &RequestHead, max_target_len: usize) -> Result<Request, ParseError> {
    let header_block = head.header_block();
    let (method, raw_target) = parse_request_line(&header_block, max_target_len)?;
    let declared_length = content_length(&header_block);

    Ok(Request {
        method,
        raw_target,
        header_block,
        body_prefix: head.body_prefix(),
        declared_length,
    })
}

/// Extracts the method and request-target from the first line.
pub fn parse_request_line(
    header_block: &[u8],
    max_target_len: usize,
) -> Result<(Method, String), ParseError> {
    // Blank bytes ahead of the request line are skipped.
    let start = header_block
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(header_block.len());
    let first_line = header_block[start..]
        .split(|&b| b == b'\n')
        .next()
        .unwrap_or_default();

    let mut tokens = first_line
        .split(|b| b.is_ascii_whitespace())
        .filter(|t| !t.is_empty());

    let method = tokens.next().ok_or(ParseError::MalformedRequestLine)?;
    let target = tokens.next().ok_or(ParseError::MalformedRequestLine)?;

    if target.len() > max_target_len {
        return Err(ParseError::TargetTooLong {
            len: target.len(),
            max: max_target_len,
        });
    }

    let method = &method[..method.len().min(MAX_METHOD_LEN)];
    let method = Method::from_token(&String::from_utf8_lossy(method));
    let target = String::from_utf8_lossy(target).into_owned();

    Ok((method, target))
}

/// Returns the raw value of the first header line named `name`, with
/// leading blanks and the line ending removed. Names compare ASCII case-insensitively.
pub fn header_value<'a>(header_block: &'a [u8], name: &str) -> Option<&'a [u8]> {
    let name = name.as_bytes();

    header_block.split(|&b| b == b'\n').find_map(|line| {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let matches = line.len() > name.len()
            && line[..name.len()].eq_ignore_ascii_case(name)
            && line[name.len()] == b':';
        if !matches {
            return None;
        }

        let value = &line[name.len() + 1..];
        let start = value
            .iter()
            .position(|&b| b != b' ' && b != b'\t')
            .unwrap_or(value.len());
        Some(&value[start..])
    })
}

/// The declared body length.
///
/// A missing header, a value without leading digits, a negative value and an
/// overflowing value all mean "no valid length". Trailing bytes after the
/// digits (a stray `\r`, say) are ignored.
pub fn content_length(header_block: &[u8]) -> Option<u64> {
    let value = header_value(header_block, "Content-Length")?;

    let (negative, digits) = match value.first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };

    let end = digits
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let parsed = std::str::from_utf8(&digits[..end]).ok()?.parse::<u64>().ok()?;
    if negative && parsed != 0 {
        return None;
    }
    Some(parsed)
}
