mod room_store;

pub use room_store::*;
