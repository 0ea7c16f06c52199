mod rtc_connection;
mod webrtc_connection;

pub use rtc_connection::*;
pub use webrtc_connection::*;
