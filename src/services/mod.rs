//! Services
//!
//! Host capability providers, the remote control gateway and logging setup.

pub mod host;
pub mod logging;
pub mod remote;

pub use host::HostCapabilities;
pub use logging::{init_logging, LoggingGuard};
pub use remote::gateway::RemoteGatewayService;
