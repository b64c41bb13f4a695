use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Reveal,
    Choice,
}

/// Which trial currently owns each input control.
///
/// Binding a control replaces whatever was bound before; there is at most one
/// handler per control, so events from an earlier trial can never fire into a
/// later one.
#[derive(Debug, Clone, Default)]
pub struct ControlBindings {
    reveal: Option<usize>,
    choice: Option<usize>,
}

impl ControlBindings {
    fn slot(&mut self, control: Control) -> &mut Option<usize> {
        match control {
            Control::Reveal => &mut self.reveal,
            Control::Choice => &mut self.choice,
        }
    }

    /// Returns the trial whose binding was replaced, if any.
    pub fn bind(&mut self, control: Control, trial: usize) -> Option<usize> {
        let previous = self.slot(control).replace(trial);
        if let Some(old) = previous.filter(|old| *old != trial) {
            debug!(?control, old, trial, "replaced stale binding");
        }
        previous
    }

    pub fn unbind(&mut self, control: Control) -> Option<usize> {
        self.slot(control).take()
    }

    pub fn clear(&mut self) {
        self.reveal = None;
        self.choice = None;
    }

    pub fn bound(&self, control: Control) -> Option<usize> {
        match control {
            Control::Reveal => self.reveal,
            Control::Choice => self.choice,
        }
    }

    pub fn is_bound_to(&self, control: Control, trial: usize) -> bool {
        self.bound(control) == Some(trial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_replaces_previous_owner() {
        let mut bindings = ControlBindings::default();
        assert_eq!(bindings.bind(Control::Reveal, 0), None);
        assert_eq!(bindings.bind(Control::Reveal, 1), Some(0));
        assert!(!bindings.is_bound_to(Control::Reveal, 0));
        assert!(bindings.is_bound_to(Control::Reveal, 1));
    }

    #[test]
    fn controls_are_independent() {
        let mut bindings = ControlBindings::default();
        bindings.bind(Control::Reveal, 3);
        bindings.bind(Control::Choice, 3);
        assert_eq!(bindings.unbind(Control::Choice), Some(3));
        assert_eq!(bindings.bound(Control::Choice), None);
        assert_eq!(bindings.bound(Control::Reveal), Some(3));
        bindings.clear();
        assert_eq!(bindings.bound(Control::Reveal), None);
    }
}
