//! HTTP/1.0 protocol engine.
//!
//! A small subset of HTTP: one request per connection, no
//! keep-alive, no chunked encoding, lengths always known up front.
//!
//! # Architecture
//!
//! - **`reader`**: reads the request head into a bounded buffer
//! - **`parser`**: request line and header lookup
//! - **`request`**: parsed request head
//! - **`body`**: exact-length body reads (captured prefix, then socket)
//! - **`router`**: method and path prefix to handler
//! - **`response`**: status codes and the response builder
//! - **`writer`**: serializes the head and streams the body
//! - **`connection`**: the per-connection state machine
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← read until the blank line
//!        └──────┬──────┘
//!               │ head parsed         (read failure → Closed, no reply)
//!               ▼                     (bad request line → Writing 400)
//!        ┌──────────────────┐
//!        │   Processing     │ ← route, run the handler
//!        └──────┬───────────┘
//!               │ response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← head, then body
//!        └──────┬───────────┘
//!               ▼
//!        ┌──────────────────┐
//!        │     Closed       │
//!        └──────────────────┘
//! ```

pub mod body;
pub mod connection;
pub mod parser;
pub mod reader;
pub mod request;
pub mod response;
pub mod router;
pub mod writer;
