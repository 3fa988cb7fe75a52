//! Capacity-checked byte buffer.
//!
//! Every fixed-size region the service reads into (request heads, command
//! bodies, captured command output) is a [`BoundedBuf`]. Growing past the
//! capacity is a typed error, never a silent truncation.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Returned when an append would grow a [`BoundedBuf`] past its capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("buffer capacity of {capacity} bytes exceeded (needed {needed})")]
pub struct CapacityExceeded {
    pub capacity: usize,
    pub needed: usize,
}

#[derive(Debug)]
pub struct BoundedBuf {
    buf: BytesMut,
    capacity: usize,
}

impl BoundedBuf {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes that can still be appended.
    pub fn remaining(&self) -> usize {
        self.capacity - self.buf.len()
    }

    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn try_extend_from_slice(&mut self, data: &[u8]) -> Result<(), CapacityExceeded> {
        let needed = self.buf.len() + data.len();
        if needed > self.capacity {
            return Err(CapacityExceeded {
                capacity: self.capacity,
                needed,
            });
        }
        self.buf.extend_from_slice(data);
        Ok(())
    }

    /// Performs one read from `reader` into the unused capacity.
    ///
    /// Returns the number of bytes read; `Ok(0)` means end of stream, or a
    /// full buffer. Cancel-safe: if the future is dropped before it
    /// completes, the buffer is unchanged.
    pub async fn read_from<R>(&mut self, reader: &mut R) -> std::io::Result<usize>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let room = self.remaining();
        if room == 0 {
            return Ok(0);
        }

        (&mut *reader).take(room as u64).read_buf(&mut self.buf).await
    }

    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf.to_vec()
    }
}
