pub mod signal_helpers;

pub use signal_helpers::*;
pub use test_member::*;
