mod gateway;
mod track;

pub use gateway::{CaptureBackend, MediaGateway};
pub use track::{LocalStream, LocalTrack, RemoteTrack};
