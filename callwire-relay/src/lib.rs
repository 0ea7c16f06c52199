pub mod channel;
pub mod room;
pub mod signaling;

pub use channel::*;
pub use room::*;
pub use signaling::*;
