use negtrack_core::View;

/// The screen as the sequencer sees it.
pub trait DisplaySurface {
    fn show(&mut self, view: View);

    /// The view last shown.
    fn current(&self) -> View;
}

/// Keeps every view it was asked to show; the last one is on screen.
#[derive(Debug, Clone, Default)]
pub struct ViewLog {
    history: Vec<View>,
}

impl ViewLog {
    pub fn times_shown(&self, view: View) -> usize {
        self.history.iter().filter(|v| **v == view).count()
    }
}

impl DisplaySurface for ViewLog {
    fn show(&mut self, view: View) {
        self.history.push(view);
    }

    fn current(&self) -> View {
        self.history.last().copied().unwrap_or_default()
    }
}
