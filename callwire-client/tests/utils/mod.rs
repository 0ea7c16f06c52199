pub mod signal_helpers;

pub use call_harness::*;
pub use fake_capture::*;
pub use fake_rtc::*;
pub use flaky_channel::*;
pub use protocol_pair::*;
pub use relay_server::*;
pub use signal_helpers::*;
pub use wait::*;
