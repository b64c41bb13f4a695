use negtrack_core::View;
use negtrack_experiment::DisplaySurface;
use std::sync::Arc;
use tracing::debug;
use winit::window::Window;

/// The window's side of the display: holds the active view and asks for a
/// redraw whenever the session switches to another one.
#[derive(Debug, Default)]
pub struct WindowSurface {
    view: View,
    window: Option<Arc<Window>>,
}

impl WindowSurface {
    /// Redraw requests go to `window` from now on.
    pub fn attach(&mut self, window: Arc<Window>) {
        window.request_redraw();
        self.window = Some(window);
    }
}

impl DisplaySurface for WindowSurface {
    fn show(&mut self, view: View) {
        if view != self.view {
            debug!(from = %self.view, to = %view, "view changed");
        }
        self.view = view;
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn current(&self) -> View {
        self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holds_only_the_active_view() {
        let mut surface = WindowSurface::default();
        assert_eq!(surface.current(), View::Instructions);
        surface.show(View::Stage);
        surface.show(View::Stage);
        surface.show(View::Background);
        assert_eq!(surface.current(), View::Background);
    }
}
