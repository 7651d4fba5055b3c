//! Server lifecycle: socket binding, the accept loop, and shutdown.

pub mod listener;
pub mod shutdown;

pub use listener::Server;
pub use shutdown::{LifecycleState, ShutdownHandle, ShutdownKind, ShutdownSignal};
