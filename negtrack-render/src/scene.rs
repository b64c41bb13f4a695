use negtrack_core::View;

/// Everything the renderer needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Scene<'a> {
    Instructions {
        text: &'a str,
        start_enabled: bool,
    },
    Stage {
        word: Option<&'a str>,
        reveal_visible: bool,
        choices_enabled: bool,
        left_label: &'a str,
        right_label: &'a str,
        progress: Option<(usize, usize)>,
    },
    Background {
        question: &'a str,
        options: &'a [&'a str],
        selected: Option<usize>,
        /// Typed answer, for text questions.
        text: Option<&'a str>,
        warning: Option<&'a str>,
    },
    Finished,
}

impl Scene<'_> {
    pub fn view(&self) -> View {
        match self {
            Scene::Instructions { .. } => View::Instructions,
            Scene::Stage { .. } => View::Stage,
            Scene::Background { .. } => View::Background,
            Scene::Finished => View::Finished,
        }
    }

    pub fn option_count(&self) -> usize {
        match self {
            Scene::Background { options, .. } => options.len(),
            _ => 0,
        }
    }
}
