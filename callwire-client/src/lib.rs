mod config;
mod error;

pub mod connection;
pub mod media;
pub mod negotiator;
pub mod protocol;
pub mod session;
pub mod signal;

pub use config::{ClientConfig, RetryPolicy};
pub use connection::*;
pub use error::{MediaError, NegotiationError, RtcError, SessionError};
pub use media::*;
pub use negotiator::*;
pub use protocol::*;
pub use session::*;
pub use signal::*;
