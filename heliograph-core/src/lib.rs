pub mod model;

pub use model::{ParticipantId, RoomId};
