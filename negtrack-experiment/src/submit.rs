use crate::session::SessionResult;
use negtrack_core::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Receives the final session result. Called once per session.
pub trait SubmissionSink {
    fn submit(&mut self, result: &SessionResult) -> Result<()>;
}

/// Writes the result as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SubmissionSink for JsonFileSink {
    fn submit(&mut self, result: &SessionResult) -> Result<()> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, result)?;
        writer.flush()?;
        info!(path = %self.path.display(), trials = result.data.len(), "results saved");
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub submissions: Vec<SessionResult>,
}

impl SubmissionSink for MemorySink {
    fn submit(&mut self, result: &SessionResult) -> Result<()> {
        self.submissions.push(result.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::BackgroundAnswers;
    use negtrack_core::{Error, Truth};

    fn empty_result() -> SessionResult {
        SessionResult {
            trials: vec![],
            completed: vec![1, 0],
            left_side: Truth::False,
            data: vec![],
            background: BackgroundAnswers::default(),
        }
    }

    #[test]
    fn json_sink_round_trips_result() {
        let path = std::env::temp_dir().join(format!("negtrack-sink-{}.json", std::process::id()));
        let mut sink = JsonFileSink::new(&path);
        sink.submit(&empty_result()).unwrap();

        let written: SessionResult =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, empty_result());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn json_sink_reports_io_errors() {
        let mut sink = JsonFileSink::new("/nonexistent/negtrack/out.json");
        assert!(matches!(sink.submit(&empty_result()), Err(Error::Io(_))));
    }
}
