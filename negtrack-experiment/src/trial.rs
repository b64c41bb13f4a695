use crate::cursor::CursorRecorder;
use negtrack_core::{TrialRecord, TrialSpec, TrialState, Truth};
use negtrack_timing::ns_to_ms;
use std::time::Duration;

/// One trial in progress.
#[derive(Debug, Clone)]
pub struct Trial {
    pub id: usize,
    pub spec: TrialSpec,
    pub item: String,
    pub tokens: Vec<String>,
    pub state: TrialState,
    pub timestamps: TrialTimestamps,
    revealed: usize,
    read_time: Vec<u64>,
    cursor_interval: Duration,
    cursor: Option<CursorRecorder>,
}

#[derive(Debug, Clone, Default)]
pub struct TrialTimestamps {
    pub reveal_start: Option<u64>,
    pub last_reveal: Option<u64>,
    pub decision_start: Option<u64>,
}

impl Trial {
    pub fn new(
        id: usize,
        spec: TrialSpec,
        item: String,
        tokens: Vec<String>,
        cursor_interval: Duration,
    ) -> Self {
        Self {
            id,
            spec,
            item,
            tokens,
            state: TrialState::AwaitingReveal,
            timestamps: TrialTimestamps::default(),
            revealed: 0,
            read_time: Vec::with_capacity(16),
            cursor_interval,
            cursor: None,
        }
    }

    /// Shows the next word. Returns its index, or None once the sentence is complete.
    ///
    /// Each reveal logs the time since the previous one; the first reveal marks the
    /// reveal start and therefore logs 0. Revealing the last word starts the decision
    /// phase and cursor recording.
    pub fn reveal(&mut self, now: u64) -> Option<usize> {
        match self.state {
            TrialState::AwaitingReveal => {
                self.timestamps.reveal_start = Some(now);
                self.state = TrialState::RevealingWords;
            }
            TrialState::RevealingWords => {}
            TrialState::AwaitingChoice | TrialState::Recorded => return None,
        }

        let previous = self
            .timestamps
            .last_reveal
            .or(self.timestamps.reveal_start)
            .unwrap_or(now);
        self.read_time.push(ns_to_ms(now.saturating_sub(previous)));
        self.timestamps.last_reveal = Some(now);

        let index = self.revealed;
        self.revealed += 1;

        if self.revealed >= self.tokens.len() {
            self.state = TrialState::AwaitingChoice;
            self.timestamps.decision_start = Some(now);
            self.cursor = Some(CursorRecorder::new(now, self.cursor_interval));
        }
        Some(index)
    }

    /// Word currently on screen.
    pub fn current_word(&self) -> Option<&str> {
        self.revealed
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(String::as_str)
    }

    pub fn read_time(&self) -> &[u64] {
        &self.read_time
    }

    /// Only recorded while the choice is pending.
    pub fn record_cursor(&mut self, x: f64, y: f64, now: u64) -> bool {
        match (&self.state, self.cursor.as_mut()) {
            (TrialState::AwaitingChoice, Some(recorder)) => recorder.on_move(x, y, now),
            _ => false,
        }
    }

    /// Closes the trial with `selection` and builds its record.
    ///
    /// The leading reveal-start entry is dropped from the latency list and a final
    /// entry of (last latency + decision time) appended, so the list has one entry per
    /// word. That final entry is not the reading time of the last word, which cannot
    /// be separated from the decision.
    pub fn choose(
        &mut self,
        selection: Truth,
        left_side: Truth,
        condition: &str,
        now: u64,
    ) -> Option<TrialRecord> {
        if self.state != TrialState::AwaitingChoice {
            return None;
        }
        let trajectory = self.cursor.take().map(CursorRecorder::finish).unwrap_or_default();

        let decision_start = self.timestamps.decision_start.unwrap_or(now);
        let rt = ns_to_ms(now.saturating_sub(decision_start));
        let total_read_time = match (self.timestamps.reveal_start, self.timestamps.last_reveal) {
            (Some(start), Some(last)) => ns_to_ms(last.saturating_sub(start)),
            _ => 0,
        };

        let mut read_time = std::mem::take(&mut self.read_time);
        let last_latency = read_time.last().copied().unwrap_or(0);
        if !read_time.is_empty() {
            read_time.remove(0);
        }
        read_time.push(last_latency + rt);

        let truth = self.spec.truth();
        self.state = TrialState::Recorded;

        Some(TrialRecord {
            left_side,
            item: self.item.clone(),
            sentence: self.tokens.clone(),
            truth,
            polarity: self.spec.polarity(),
            selection,
            correct: u8::from(selection == truth),
            x_coord: trajectory.x_coord,
            y_coord: trajectory.y_coord,
            coord_timing: trajectory.coord_timing,
            rt,
            read_time,
            total_read_time,
            condition: condition.to_string(),
        })
    }
}
