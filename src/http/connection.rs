use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::files;
use crate::http::parser::parse_request;
use crate::http::reader::read_request_head;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::router::Route;
use crate::http::writer::ResponseWriter;
use crate::server::ServiceContext;

/// Serves exactly one request on `stream`, then closes it.
pub struct Connection<S> {
    stream: S,
    ctx: Arc<ServiceContext>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, ctx: Arc<ServiceContext>) -> Self {
        Self {
            stream,
            ctx,
            state: ConnectionState::Reading,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    self.state = match self.read_request().await {
                        Ok(req) => ConnectionState::Processing(req),
                        Err(response) => match response {
                            Some(response) => self.writing(response),
                            None => ConnectionState::Closed,
                        },
                    };
                }

                ConnectionState::Processing(req) => {
                    let response = self.handle_request(&req).await;
                    tracing::info!(
                        method = req.method.as_str(),
                        path = %req.path(),
                        status = response.status.as_u16(),
                        bytes = response.content_length(),
                        "request served"
                    );
                    self.state = self.writing(response);
                }

                ConnectionState::Writing(writer) => {
                    writer.write_to_stream(&mut self.stream).await?;
                    // One request per connection, always.
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => {
                    if let Err(e) = self.stream.shutdown().await {
                        tracing::debug!(error = %e, "shutdown after response failed");
                    }
                    break;
                }
            }
        }

        Ok(())
    }

    fn writing(&self, response: Response) -> ConnectionState {
        ConnectionState::Writing(ResponseWriter::new(response, self.ctx.limits.chunk_size))
    }

    /// Reads and parses the request head.
    ///
    /// `Err(None)` abandons the connection without an answer; `Err(Some)`
    /// carries the 400 to send instead.
    pub async fn read_request(&mut self) -> Result<Request, Option<Response>> {
        let limits = &self.ctx.limits;

        let head = match read_request_head(&mut self.stream, limits.header_buffer_bytes).await {
            Ok(head) => head,
            Err(e) => {
                tracing::debug!(error = %e, "request abandoned");
                return Err(None);
            }
        };

        parse_request(&head, limits.max_target_len).map_err(|e| {
            tracing::debug!(error = %e, "malformed request line");
            Some(Response::bad_request("Bad Request\n"))
        })
    }

    async fn handle_request(&mut self, req: &Request) -> Response {
        let ctx = Arc::clone(&self.ctx);
        let root = ctx.root.as_path();
        let max_path = ctx.limits.max_path_len;

        match Route::resolve(&req.method, req.path()) {
            Route::Listing(path) => files::serve_listing(root, path, max_path).await,
            Route::Download(path) => files::serve_download(root, path, max_path).await,
            Route::Delete(path) => files::handle_delete(root, path, max_path).await,
            Route::Upload(path) => {
                files::handle_upload(
                    root,
                    path,
                    max_path,
                    req.declared_length,
                    req.body_prefix.clone(),
                    &mut self.stream,
                    ctx.limits.chunk_size,
                )
                .await
            }
            Route::Exec => {
                ctx.exec
                    .handle(
                        req.declared_length,
                        req.body_prefix.clone(),
                        &mut self.stream,
                        ctx.shutdown.subscribe(),
                    )
                    .await
            }
            Route::NotFound => Response::not_found(),
            Route::MethodNotAllowed => Response::method_not_allowed(),
        }
    }
}
