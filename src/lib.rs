//! Plinth - Static Asset Server
//!
//! Serves a pre-built directory of files over plain HTTP with SPA fallback
//! routing and graceful shutdown.

pub mod config;
pub mod http;
pub mod serve;
pub mod server;
