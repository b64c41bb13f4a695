pub mod error;
pub mod phase;
pub mod stimulus;
pub mod trial;

pub use error::{Error, Result};
pub use phase::View;
pub use stimulus::{Item, StimulusSet, Variant};
pub use trial::{
    ButtonLayout, Polarity, Side, TrialRecord, TrialSpec, TrialState, TrialType, Truth,
};
