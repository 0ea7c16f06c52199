mod backoff;
mod retry;
mod ws_channel;

pub use backoff::BackoffDelayer;
pub use retry::RetryingChannel;
pub use ws_channel::WsSignalChannel;
