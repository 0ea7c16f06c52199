mod seen;
mod signaling_protocol;

pub use seen::SeenMessages;
pub use signaling_protocol::{BootstrapRole, SignalingProtocol};
