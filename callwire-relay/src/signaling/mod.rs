mod relay_service;
mod server;
mod ws_handler;

pub use relay_service::*;
pub use server::*;
pub use ws_handler::*;
