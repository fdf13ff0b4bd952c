pub mod controller;
pub mod sequencer;

pub use controller::{ConnectionController, ConnectionState};
pub use sequencer::OrderIdSequencer;
