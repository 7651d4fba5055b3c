//! HTTP protocol implementation.
//!
//! A minimal HTTP/1.1 server layer with keep-alive support. Every request,
//! regardless of method, is treated as a GET-style fetch of a static asset;
//! routing and semantics live in [`crate::serve`].
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for incoming request data
//!        └──────┬──────┘
//!               │ Request received
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Resolve path, build response
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Keep-Alive → Reading (same connection)
//!               └─ Close → Closed
//! ```

pub mod connection;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
