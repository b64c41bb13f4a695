pub mod timer;

pub use timer::{ns_to_ms, HighPrecisionTimer, ManualTimer, Timer};
