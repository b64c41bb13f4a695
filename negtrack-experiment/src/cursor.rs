use negtrack_timing::ns_to_ms;
use std::time::Duration;

/// Sampled pointer positions for one decision, in the record's column layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    pub x_coord: Vec<f64>,
    pub y_coord: Vec<f64>,
    /// Milliseconds since decision start.
    pub coord_timing: Vec<u64>,
}

/// Event-driven cursor recorder.
///
/// The pointer-move handler calls [`CursorRecorder::on_move`] directly; a sample
/// is kept when no sample exists yet or at least `min_interval` has passed since
/// the last kept one. Until the first move nothing is recorded.
#[derive(Debug, Clone)]
pub struct CursorRecorder {
    decision_start: u64,
    min_interval_ns: u64,
    last_sample: Option<u64>,
    trajectory: Trajectory,
}

impl CursorRecorder {
    pub fn new(decision_start: u64, min_interval: Duration) -> Self {
        Self {
            decision_start,
            min_interval_ns: min_interval.as_nanos() as u64,
            last_sample: None,
            trajectory: Trajectory::default(),
        }
    }

    /// Returns true if the position was kept.
    pub fn on_move(&mut self, x: f64, y: f64, now: u64) -> bool {
        if let Some(last) = self.last_sample {
            if now.saturating_sub(last) < self.min_interval_ns {
                return false;
            }
        }
        self.trajectory.x_coord.push(x);
        self.trajectory.y_coord.push(y);
        self.trajectory
            .coord_timing
            .push(ns_to_ms(now.saturating_sub(self.decision_start)));
        self.last_sample = Some(now);
        true
    }

    pub fn finish(self) -> Trajectory {
        self.trajectory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: u64 = 1_000_000;

    #[test]
    fn nothing_recorded_without_movement() {
        let recorder = CursorRecorder::new(0, Duration::from_millis(25));
        assert_eq!(recorder.finish(), Trajectory::default());
    }

    #[test]
    fn first_move_is_always_kept() {
        let mut recorder = CursorRecorder::new(100 * MS, Duration::from_millis(25));
        assert!(recorder.on_move(5.0, 6.0, 103 * MS));
        let t = recorder.finish();
        assert_eq!(t.x_coord, vec![5.0]);
        assert_eq!(t.y_coord, vec![6.0]);
        assert_eq!(t.coord_timing, vec![3]);
    }

    #[test]
    fn moves_inside_interval_are_dropped() {
        let mut recorder = CursorRecorder::new(0, Duration::from_millis(25));
        let kept: Vec<bool> = [0, 10, 24, 25, 40, 60]
            .iter()
            .map(|ms| recorder.on_move(*ms as f64, 0.0, ms * MS))
            .collect();
        assert_eq!(kept, vec![true, false, false, true, false, true]);
        assert_eq!(recorder.finish().coord_timing, vec![0, 25, 60]);
    }
}
