/// Named view regions the session moves through.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Instructions,
    Stage,
    Background,
    Finished,
}

impl View {
    /// Region identifier as the display surface knows it.
    pub fn region(&self) -> &'static str {
        match self {
            View::Instructions => "instructions",
            View::Stage => "trial-stage",
            View::Background => "background-form",
            View::Finished => "finished",
        }
    }

    /// Whether clicks and typing reach the session in this view.
    pub fn allows_input(&self) -> bool {
        !matches!(self, View::Finished)
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.region())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_open_on_the_instructions() {
        assert_eq!(View::default(), View::Instructions);
        assert!(View::Instructions.allows_input());
        assert!(View::Background.allows_input());
    }

    #[test]
    fn regions_use_surface_names() {
        assert_eq!(View::Stage.region(), "trial-stage");
        assert_eq!(View::Background.to_string(), "background-form");
        assert!(!View::Finished.allows_input());
    }
}
