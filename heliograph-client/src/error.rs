use std::time::Duration;
use thiserror::Error;

/// Errors crossing the client core's public boundary. Everything else is
/// absorbed and logged where it happens.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("signaling connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("signaling transport error: {0}")]
    Signaling(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("signaling channel closed")]
    SignalingClosed,

    #[error("negotiation already in flight for this peer")]
    NegotiationInFlight,

    #[error("webrtc error: {0}")]
    Rtc(#[from] webrtc::Error),

    #[error("session already closed")]
    Closed,
}
