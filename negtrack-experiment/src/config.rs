use negtrack_core::{Error, Result, StimulusSet, Variant};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub variant: Variant,
    /// JSON stimulus set used instead of the variant's built-in set.
    pub stimuli: Option<PathBuf>,
    /// Minimum spacing between recorded cursor samples.
    pub cursor_interval_ms: u64,
    /// Delay between showing the finished view and submitting.
    pub submit_delay_ms: u64,
    /// Preview sessions can read the instructions but not start.
    pub preview: bool,
    pub seed: Option<u64>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            variant: Variant::NoContext,
            stimuli: None,
            cursor_interval_ms: 25,
            submit_delay_ms: 1500,
            preview: false,
            seed: None,
        }
    }
}

impl ExperimentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.cursor_interval_ms == 0 {
            return Err(Error::Config(
                "cursor_interval_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn cursor_interval(&self) -> Duration {
        Duration::from_millis(self.cursor_interval_ms)
    }

    pub fn submit_delay(&self) -> Duration {
        Duration::from_millis(self.submit_delay_ms)
    }

    pub fn stimulus_set(&self) -> Result<StimulusSet> {
        match &self.stimuli {
            Some(path) => StimulusSet::load(path),
            None => Ok(self.variant.stimulus_set()),
        }
    }
}
