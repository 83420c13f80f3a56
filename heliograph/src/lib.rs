pub use heliograph_core::model::{ParticipantId, ParticipantInfo, RoomId};

pub mod model {
    pub use heliograph_core::model::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use heliograph_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use heliograph_client::*;
}
