use crate::config::{AppConfig, DisplayConfig};
use crate::surface::WindowSurface;
use ab_glyph::FontVec;
use anyhow::{Result, anyhow};
use negtrack_core::{Side, View};
use negtrack_experiment::background::AnswerKind;
use negtrack_experiment::{
    DisplaySurface, ExperimentEvent, ExperimentStateMachine, JsonFileSink, SubmissionSink,
};
use negtrack_render::{Scene, SkiaRenderer, Target, TextStyle};
use negtrack_timing::{HighPrecisionTimer, Timer};
use pixels::{Pixels, SurfaceTexture};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tracing::{error, info, trace, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

type Experiment = ExperimentStateMachine<HighPrecisionTimer, WindowSurface, JsonFileSink>;

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    experiment: Experiment,
    renderer: Option<SkiaRenderer>,
    font: Option<FontVec>,
    display: DisplayConfig,
    current_size: Option<PhysicalSize<u32>>,
    scale_factor: f64,
    refresh_rate: Option<f64>,
    cursor: (f64, f64),

    should_exit: bool,
}

impl App {
    pub fn new(config: AppConfig, font: FontVec) -> Result<Self> {
        let stimuli = config.experiment.stimulus_set()?;
        let mut rng = match config.experiment.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let sink = JsonFileSink::new(&config.output.path);
        let experiment = ExperimentStateMachine::new(
            config.experiment,
            stimuli,
            HighPrecisionTimer::new(),
            &mut rng,
            WindowSurface::default(),
            sink,
        )?;

        Ok(Self {
            window: None,
            pixels: None,
            experiment,
            renderer: None,
            font: Some(font),
            display: config.display,
            current_size: None,
            scale_factor: 1.0,
            refresh_rate: None,
            cursor: (0.0, 0.0),
            should_exit: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        info!(
            os = std::env::consts::OS,
            arch = std::env::consts::ARCH,
            condition = %self.experiment.stimuli.condition,
            output = %self.experiment.sink().path().display(),
            "starting negtrack, ESC exits"
        );
        event_loop.run_app(&mut self).map_err(Into::into)
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let primary_monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or_else(|| anyhow!("No monitor available"))?;

        self.refresh_rate = primary_monitor
            .refresh_rate_millihertz()
            .map(|rate| rate as f64 / 1000.0);

        let mut window_attributes = Window::default_attributes().with_title("negtrack");
        window_attributes = if self.display.fullscreen {
            window_attributes
                .with_fullscreen(Some(Fullscreen::Borderless(Some(primary_monitor))))
                .with_resizable(false)
        } else {
            window_attributes.with_inner_size(PhysicalSize::new(1280, 800))
        };

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let physical_size = window.inner_size();
        self.current_size = Some(physical_size);
        self.scale_factor = window.scale_factor();

        info!(
            width = physical_size.width,
            height = physical_size.height,
            scale_factor = self.scale_factor,
            refresh_hz = ?self.refresh_rate,
            "display configured"
        );

        let surface_texture =
            SurfaceTexture::new(physical_size.width, physical_size.height, window.clone());
        self.pixels = Some(Pixels::new(
            physical_size.width,
            physical_size.height,
            surface_texture,
        )?);

        let font = self
            .font
            .take()
            .ok_or_else(|| anyhow!("font already handed to a renderer"))?;
        let mut renderer = SkiaRenderer::new(
            physical_size.width,
            physical_size.height,
            font,
            self.display.word_size,
        )?;
        renderer.preload(self.experiment.stimuli.vocabulary(), TextStyle::Word);
        renderer.preload(
            [Side::Left, Side::Right].map(|side| self.experiment.label(side)),
            TextStyle::Label,
        );
        self.renderer = Some(renderer);

        self.experiment.surface_mut().attach(window.clone());
        self.window = Some(window);

        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };
        let scene = scene(&self.experiment);
        let stats = renderer.render_frame(&scene, pixels.frame_mut(), &self.experiment.timer)?;
        pixels.render()?;

        trace!(
            clear_ms = stats.clear.as_secs_f64() * 1e3,
            draw_ms = stats.draw.as_secs_f64() * 1e3,
            copy_ms = stats.copy.as_secs_f64() * 1e3,
            total_ms = stats.total.as_secs_f64() * 1e3,
            dirty = stats.dirty_count,
            "frame"
        );
        Ok(())
    }

    fn update(&mut self) {
        for event in self.experiment.update() {
            self.experiment.handle_event(event);
        }
    }

    fn view(&self) -> View {
        self.experiment.surface().current()
    }

    fn handle_click(&mut self, x: f64, y: f64) {
        let Some(renderer) = &self.renderer else {
            return;
        };
        let scene = scene(&self.experiment);
        let view = scene.view();
        if !view.allows_input() {
            return;
        }
        let options = scene.option_count();
        let Some(target) = renderer.layout().hit_test(view, options, x as f32, y as f32) else {
            return;
        };
        let event = match target {
            Target::Start => ExperimentEvent::Start,
            Target::Reveal => ExperimentEvent::Reveal,
            Target::Choice(side) => ExperimentEvent::Choose(side),
            Target::FormOption(i) => ExperimentEvent::SelectOption(i),
            Target::FormNext => ExperimentEvent::SubmitAnswer,
        };
        self.experiment.handle_event(event);
    }

    fn handle_key(&mut self, event: &KeyEvent, event_loop: &ActiveEventLoop) {
        match event.physical_key {
            PhysicalKey::Code(KeyCode::Escape) => {
                self.cleanup_and_exit(event_loop);
                return;
            }
            _ if !self.view().allows_input() => return,
            PhysicalKey::Code(KeyCode::Enter | KeyCode::NumpadEnter) => {
                self.experiment.handle_event(ExperimentEvent::SubmitAnswer);
                return;
            }
            PhysicalKey::Code(KeyCode::Backspace) => {
                self.experiment.handle_event(ExperimentEvent::Backspace);
                return;
            }
            _ => {}
        }
        if self.view() != View::Background {
            return;
        }
        if let Some(text) = &event.text {
            for c in text.chars() {
                self.experiment.handle_event(ExperimentEvent::TypeChar(c));
            }
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 || self.current_size == Some(new_size) {
            return;
        }
        self.current_size = Some(new_size);
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                error!("failed to resize surface: {e}");
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                error!("failed to resize buffer: {e}");
            }
        }
        if let Some(renderer) = &mut self.renderer {
            if let Err(e) = renderer.resize(new_size.width, new_size.height) {
                error!("failed to resize renderer: {e}");
            }
        }
        info!(width = new_size.width, height = new_size.height, "display resized");
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        match self.view() {
            View::Finished if !self.experiment.is_submitted() => {
                self.experiment.submit_now();
            }
            View::Finished => {}
            view => warn!(
                %view,
                completed = self.experiment.results().len(),
                "exiting before the session finished, nothing submitted"
            ),
        }
        self.should_exit = true;
        event_loop.exit();
    }
}

/// What the current experiment state looks like on screen.
fn scene<T, D, K>(experiment: &ExperimentStateMachine<T, D, K>) -> Scene<'_>
where
    T: Timer,
    D: DisplaySurface,
    K: SubmissionSink,
{
    match experiment.surface().current() {
        View::Instructions => Scene::Instructions {
            text: experiment.instructions(),
            start_enabled: !experiment.is_preview(),
        },
        View::Stage => Scene::Stage {
            word: experiment.current_word(),
            reveal_visible: experiment.reveal_visible(),
            choices_enabled: experiment.choices_enabled(),
            left_label: experiment.label(Side::Left),
            right_label: experiment.label(Side::Right),
            progress: experiment.trial_progress(),
        },
        View::Background => {
            let form = experiment.form();
            match form.current() {
                Some(question) => Scene::Background {
                    question: question.prompt(),
                    options: question.options(),
                    selected: form.selected(),
                    text: matches!(question.kind(), AnswerKind::Text { .. }).then(|| form.text()),
                    warning: form.prompt(),
                },
                None => Scene::Finished,
            }
        }
        View::Finished => Scene::Finished,
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                error!("failed to create window and surface: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render() {
                    error!("render failed: {e:#}");
                }
                self.update();
                if let Some(win) = &self.window {
                    win.request_redraw();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.view() == View::Stage {
                    self.experiment.handle_event(ExperimentEvent::CursorMoved {
                        x: position.x,
                        y: position.y,
                    });
                }
                self.cursor = (position.x, position.y);
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                let (x, y) = self.cursor;
                self.handle_click(x, y);
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() => {
                self.handle_key(&event, event_loop);
            }
            WindowEvent::Resized(sz) => self.handle_resize(sz),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = scale_factor;
                if let Some(window) = &self.window {
                    self.handle_resize(window.inner_size());
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use negtrack_core::StimulusSet;
    use negtrack_experiment::{ExperimentConfig, MemorySink};
    use negtrack_timing::ManualTimer;

    fn experiment(preview: bool) -> ExperimentStateMachine<ManualTimer, WindowSurface, MemorySink> {
        let config = ExperimentConfig {
            preview,
            ..Default::default()
        };
        ExperimentStateMachine::new(
            config,
            StimulusSet::no_context(),
            ManualTimer::new(),
            &mut StdRng::seed_from_u64(4),
            WindowSurface::default(),
            MemorySink::default(),
        )
        .unwrap()
    }

    #[test]
    fn preview_disables_start() {
        let exp = experiment(true);
        let Scene::Instructions { start_enabled, .. } = scene(&exp) else {
            panic!("expected instructions");
        };
        assert!(!start_enabled);
    }

    #[test]
    fn stage_scene_follows_the_trial() {
        let mut exp = experiment(false);
        exp.handle_event(ExperimentEvent::Start);
        match scene(&exp) {
            Scene::Stage {
                word,
                reveal_visible,
                choices_enabled,
                progress,
                ..
            } => {
                assert_eq!(word, None);
                assert!(reveal_visible);
                assert!(!choices_enabled);
                assert_eq!(progress, Some((1, 12)));
            }
            other => panic!("unexpected scene {other:?}"),
        }
    }

    #[test]
    fn scene_is_drawn_from_the_window_surface() {
        let mut exp = experiment(false);
        assert_eq!(exp.surface().current(), View::Instructions);
        assert_eq!(scene(&exp).view(), View::Instructions);
        exp.handle_event(ExperimentEvent::Start);
        assert_eq!(exp.surface().current(), View::Stage);
        assert_eq!(scene(&exp).view(), View::Stage);
    }
}
