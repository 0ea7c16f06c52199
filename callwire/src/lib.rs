pub use callwire_core::{ChannelError, ParticipantId, RoomId, RoomStore, SignalChannel};

pub mod model {
    pub use callwire_core::model::*;
}

#[cfg(feature = "relay")]
pub mod relay {
    pub use callwire_relay::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use callwire_client::*;
}
