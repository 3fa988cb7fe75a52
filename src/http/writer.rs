use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::response::{Body, Response};

const HTTP_VERSION: &str = "HTTP/1.0";

/// Status line, headers and the blank line that ends them.
pub fn serialize_head(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);

    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    for (k, v) in &resp.headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    buf.extend_from_slice(b"\r\n");
    buf
}

pub struct ResponseWriter {
    head: Vec<u8>,
    body: Body,
    chunk_size: usize,
}

impl ResponseWriter {
    pub fn new(response: Response, chunk_size: usize) -> Self {
        Self {
            head: serialize_head(&response),
            body: response.body,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Sends the response. Returns the number of body bytes written.
    ///
    /// The length is already committed in the head, so a file that fails
    /// mid-stream, or a peer that goes away, just ends the body early.
    pub async fn write_to_stream<W>(self, stream: &mut W) -> anyhow::Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        stream.write_all(&self.head).await?;

        let sent = match self.body {
            Body::Bytes(bytes) => {
                stream.write_all(&bytes).await?;
                bytes.len() as u64
            }
            Body::File { file, len } => stream_file(file, len, stream, self.chunk_size).await,
        };

        stream.flush().await?;
        Ok(sent)
    }
}

async fn stream_file<W>(file: tokio::fs::File, len: u64, stream: &mut W, chunk_size: usize) -> u64
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut file = file.take(len);
    let mut chunk = vec![0u8; chunk_size];
    let mut sent = 0u64;

    loop {
        let n = match file.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                tracing::debug!(error = %e, sent, len, "file read failed, body cut short");
                break;
            }
        };

        if let Err(e) = stream.write_all(&chunk[..n]).await {
            tracing::debug!(error = %e, sent, len, "peer write failed, body cut short");
            break;
        }
        sent += n as u64;
    }

    sent
}
