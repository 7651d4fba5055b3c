//! Static asset serving.
//!
//! The domain layer on top of [`crate::http`]:
//!
//! - **`mime`**: extension → content-type lookup table
//! - **`resolve`**: request path → filesystem path under the configured root
//! - **`policy`**: security and caching headers for successful serves
//! - **`handler`**: ties the above together, with SPA fallback for paths
//!   that do not resolve to a file

pub mod handler;
pub mod mime;
pub mod policy;
pub mod resolve;

pub use handler::StaticHandler;
pub use mime::MimeTable;
pub use resolve::{ResolveError, ResolvedPath, Resolver};
