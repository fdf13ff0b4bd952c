pub mod correlator;

pub use correlator::{CallOptions, Correlator, Step};
