use heliograph_core::model::IceCandidate;

/// Holds ICE candidates that arrive before the remote description does.
/// Once [`CandidateBuffer::flush`] hands them out (in arrival order), later
/// candidates bypass the buffer entirely.
#[derive(Default)]
pub struct CandidateBuffer {
    queued: Vec<IceCandidate>,
    remote_ready: bool,
}

impl CandidateBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Either queues the candidate or returns it for immediate application.
    pub fn absorb(&mut self, candidate: IceCandidate) -> Option<IceCandidate> {
        if self.remote_ready {
            Some(candidate)
        } else {
            self.queued.push(candidate);
            None
        }
    }

    /// Called once, when the remote description becomes available. Yields
    /// everything queued so far, oldest first.
    pub fn flush(&mut self) -> Vec<IceCandidate> {
        self.remote_ready = true;
        std::mem::take(&mut self.queued)
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queued.len()
    }
}
