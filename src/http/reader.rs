use bytes::Bytes;
use tokio::io::AsyncRead;

use crate::buffer::BoundedBuf;

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("peer closed the connection before the end of the request head")]
    Closed,

    #[error("request head does not fit in {capacity} bytes")]
    HeaderTooLarge { capacity: usize },

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw bytes of a request head plus the body bytes read along with it.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub buf: Bytes,
    /// Offset of the header boundary; `buf[..header_len]` is the head.
    pub header_len: usize,
    /// Offset of the first body byte.
    pub body_start: usize,
}

impl RequestHead {
    pub fn header_block(&self) -> Bytes {
        self.buf.slice(..self.header_len)
    }

    pub fn body_prefix(&self) -> Bytes {
        self.buf.slice(self.body_start..)
    }
}

/// Finds the earliest blank line, `\r\n\r\n` or the looser `\n\n`.
///
/// Returns `(header_len, body_start)`.
pub fn find_boundary(buf: &[u8]) -> Option<(usize, usize)> {
    find_boundary_from(buf, 0)
}

fn find_boundary_from(buf: &[u8], from: usize) -> Option<(usize, usize)> {
    for i in from..buf.len().saturating_sub(1) {
        if buf[i..].starts_with(b"\r\n\r\n") {
            return Some((i, i + 4));
        }
        if buf[i..].starts_with(b"\n\n") {
            return Some((i, i + 2));
        }
    }
    None
}

/// Reads from `stream` until the end of the request head.
///
/// Any failure abandons the request: the caller closes the connection
/// without answering.
pub async fn read_request_head<R>(stream: &mut R, capacity: usize) -> Result<RequestHead, ReadError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = BoundedBuf::with_capacity(capacity);
    let mut scanned = 0;

    loop {
        if buf.is_full() {
            return Err(ReadError::HeaderTooLarge { capacity });
        }

        let n = buf.read_from(stream).await?;
        if n == 0 {
            return Err(ReadError::Closed);
        }

        // A boundary may straddle two reads.
        if let Some((header_len, body_start)) = find_boundary_from(buf.as_slice(), scanned) {
            return Ok(RequestHead {
                buf: buf.freeze(),
                header_len,
                body_start,
            });
        }
        scanned = buf.len().saturating_sub(3);
    }
}
