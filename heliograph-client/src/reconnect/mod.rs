mod supervisor;

pub use supervisor::{ReconnectionSupervisor, RecoveryTick};
