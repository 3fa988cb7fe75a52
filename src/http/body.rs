use bytes::{Buf, Bytes};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::buffer::CapacityExceeded;

#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    #[error("peer closed the connection with {missing} body bytes outstanding")]
    ShortBody { missing: u64 },

    #[error("body read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Overflow(#[from] CapacityExceeded),
}

/// Yields exactly `declared` body bytes.
///
/// Bytes captured together with the request head are handed out first,
/// the rest is read from the connection. Prefix bytes past the declared
/// length are dropped.
#[derive(Debug)]
pub struct BodyReader {
    prefix: Bytes,
    remaining: u64,
}

impl BodyReader {
    pub fn new(mut prefix: Bytes, declared: u64) -> Self {
        if (prefix.len() as u64) > declared {
            prefix.truncate(declared as usize);
        }
        Self {
            prefix,
            remaining: declared,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn is_done(&self) -> bool {
        self.remaining == 0
    }

    /// Fills up to `buf.len()` bytes of the body.
    ///
    /// Returns `Ok(0)` only once the whole body has been delivered.
    pub async fn read_chunk<R>(&mut self, stream: &mut R, buf: &mut [u8]) -> Result<usize, BodyError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        let want = buf.len().min(usize::try_from(self.remaining).unwrap_or(usize::MAX));

        let n = if self.prefix.has_remaining() {
            let n = want.min(self.prefix.len());
            self.prefix.copy_to_slice(&mut buf[..n]);
            n
        } else {
            let n = stream.read(&mut buf[..want]).await?;
            if n == 0 {
                return Err(BodyError::ShortBody {
                    missing: self.remaining,
                });
            }
            n
        };

        self.remaining -= n as u64;
        Ok(n)
    }
}
