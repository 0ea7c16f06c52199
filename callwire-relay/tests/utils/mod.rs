
pub use signal_helpers::*;
pub use ws_client::*;
