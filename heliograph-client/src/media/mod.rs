mod local_media;
mod remote_stream;
mod state_sync;

pub use local_media::{LocalMediaSource, LocalTrack};
pub use remote_stream::{RemoteStream, RemoteTrack};
pub use state_sync::MediaStateSync;
