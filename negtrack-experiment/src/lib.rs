pub mod background;
pub mod bindings;
pub mod config;
pub mod cursor;
pub mod session;
pub mod state;
pub mod submit;
pub mod surface;
pub mod trial;

pub use background::{BackgroundAnswers, BackgroundForm, FormStep, Question, ValidationError};
pub use config::ExperimentConfig;
pub use cursor::{CursorRecorder, Trajectory};
pub use session::{Session, SessionResult, TrialPlan};
pub use state::{ExperimentEvent, ExperimentStateMachine};
pub use submit::{JsonFileSink, MemorySink, SubmissionSink};
pub use surface::{DisplaySurface, ViewLog};
pub use trial::{Trial, TrialTimestamps};
