use crate::background::{BackgroundForm, FormStep};
use crate::bindings::{Control, ControlBindings};
use crate::config::ExperimentConfig;
use crate::session::{Session, TrialPlan};
use crate::submit::SubmissionSink;
use crate::surface::DisplaySurface;
use crate::trial::Trial;
use negtrack_core::{Error, Result, Side, StimulusSet, TrialRecord, TrialState, View};
use negtrack_timing::Timer;
use rand::Rng;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ExperimentEvent {
    Start,
    Reveal,
    Choose(Side),
    CursorMoved { x: f64, y: f64 },
    SelectOption(usize),
    TypeChar(char),
    Backspace,
    SubmitAnswer,
    SubmissionDue,
}

/// Trial sequencer and logger for one session.
pub struct ExperimentStateMachine<T, D, K>
where
    T: Timer,
    D: DisplaySurface,
    K: SubmissionSink,
{
    pub view: View,
    pub timer: T,
    pub config: ExperimentConfig,
    pub stimuli: StimulusSet,
    pub plan: TrialPlan,
    pub session: Session,
    pub current: Option<Trial>,
    pub trial_number: usize,
    sentences: Vec<Vec<String>>,
    bindings: ControlBindings,
    form: BackgroundForm,
    surface: D,
    sink: K,
    submit_at: Option<u64>,
    submitted: bool,
}

impl<T, D, K> ExperimentStateMachine<T, D, K>
where
    T: Timer,
    D: DisplaySurface,
    K: SubmissionSink,
{
    pub fn new<R: Rng + ?Sized>(
        config: ExperimentConfig,
        stimuli: StimulusSet,
        timer: T,
        rng: &mut R,
        surface: D,
        sink: K,
    ) -> Result<Self> {
        let plan = TrialPlan::random(stimuli.len(), rng);
        Self::with_plan(config, stimuli, plan, timer, surface, sink)
    }

    pub fn with_plan(
        config: ExperimentConfig,
        stimuli: StimulusSet,
        plan: TrialPlan,
        timer: T,
        surface: D,
        sink: K,
    ) -> Result<Self> {
        config.validate()?;
        stimuli.validate()?;
        plan.validate(stimuli.len())?;

        let sentences = (0..stimuli.len())
            .map(|item| {
                let spec = plan.spec(item).ok_or(Error::ItemOutOfRange {
                    index: item,
                    len: plan.types.len(),
                })?;
                stimuli.sentence(&spec)
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            condition = %stimuli.condition,
            items = stimuli.len(),
            left = %plan.layout.left,
            order = ?plan.order,
            "session planned"
        );

        let session = Session::new(&plan);
        let mut machine = Self {
            view: View::Instructions,
            timer,
            config,
            stimuli,
            plan,
            session,
            current: None,
            trial_number: 0,
            sentences,
            bindings: ControlBindings::default(),
            form: BackgroundForm::new(),
            surface,
            sink,
            submit_at: None,
            submitted: false,
        };
        machine.show(View::Instructions);
        Ok(machine)
    }

    /// Time-driven transitions. Returned events should be fed back into `handle_event`.
    pub fn update(&mut self) -> Vec<ExperimentEvent> {
        let mut events = Vec::new();
        if let (View::Finished, Some(at), false) = (self.view, self.submit_at, self.submitted) {
            if self.timer.now() >= at {
                events.push(ExperimentEvent::SubmissionDue);
            }
        }
        events
    }

    pub fn handle_event(&mut self, event: ExperimentEvent) -> bool {
        match (self.view, event) {
            (View::Instructions, ExperimentEvent::Start) => {
                if self.config.preview {
                    debug!("start ignored in preview mode");
                    return false;
                }
                self.next_trial();
                true
            }

            (View::Stage, ExperimentEvent::Reveal) => self.reveal(),
            (View::Stage, ExperimentEvent::Choose(side)) => self.choose(side),
            (View::Stage, ExperimentEvent::CursorMoved { x, y }) => {
                let now = self.timer.now();
                self.current
                    .as_mut()
                    .is_some_and(|trial| trial.record_cursor(x, y, now))
            }

            (View::Background, ExperimentEvent::SelectOption(i)) => self.form.select(i),
            (View::Background, ExperimentEvent::TypeChar(c)) => self.form.type_char(c),
            (View::Background, ExperimentEvent::Backspace) => self.form.backspace(),
            (View::Background, ExperimentEvent::SubmitAnswer) => match self.form.submit() {
                Ok(FormStep::Next(question)) => {
                    debug!(?question, "next background question");
                    true
                }
                Ok(FormStep::Complete) => {
                    self.end();
                    true
                }
                Err(e) => {
                    warn!(question = ?e.question, "{e}");
                    false
                }
            },

            (View::Finished, ExperimentEvent::SubmissionDue) => self.submit(),

            _ => false,
        }
    }

    fn show(&mut self, view: View) {
        self.view = view;
        self.surface.show(view);
    }

    /// Starts the next queued trial, or the questionnaire once the queue is empty.
    fn next_trial(&mut self) {
        let Some(item) = self.session.next_item() else {
            self.background();
            return;
        };
        let (Some(spec), Some(tokens)) = (self.plan.spec(item), self.sentences.get(item)) else {
            error!(item, "no sentence planned for item, skipping");
            self.next_trial();
            return;
        };
        let name = self
            .stimuli
            .items
            .get(item)
            .map(|i| i.name.clone())
            .unwrap_or_default();

        let trial = Trial::new(
            self.trial_number,
            spec,
            name,
            tokens.clone(),
            self.config.cursor_interval(),
        );
        self.bindings.unbind(Control::Choice);
        self.bindings.bind(Control::Reveal, trial.id);
        info!(
            trial = trial.id,
            item = %trial.item,
            trial_type = spec.trial_type.index(),
            words = trial.tokens.len(),
            "trial started"
        );
        self.current = Some(trial);
        self.show(View::Stage);
    }

    fn reveal(&mut self) -> bool {
        let Some(trial) = self.current.as_mut() else {
            return false;
        };
        if !self.bindings.is_bound_to(Control::Reveal, trial.id) {
            return false;
        }
        let now = self.timer.now();
        let Some(index) = trial.reveal(now) else {
            return false;
        };
        debug!(trial = trial.id, index, word = ?trial.current_word(), "word revealed");

        if trial.state == TrialState::AwaitingChoice {
            self.bindings.unbind(Control::Reveal);
            self.bindings.bind(Control::Choice, trial.id);
            debug!(trial = trial.id, "sentence complete, choices enabled");
        }
        true
    }

    fn choose(&mut self, side: Side) -> bool {
        let Some(trial) = self.current.as_mut() else {
            return false;
        };
        if !self.bindings.is_bound_to(Control::Choice, trial.id) {
            return false;
        }
        self.bindings.unbind(Control::Choice);

        let selection = self.plan.layout.resolve(side);
        let now = self.timer.now();
        let Some(record) = trial.choose(
            selection,
            self.plan.layout.left,
            &self.stimuli.condition,
            now,
        ) else {
            return false;
        };
        info!(
            trial = trial.id,
            item = %record.item,
            selection = %record.selection,
            correct = record.correct,
            rt_ms = record.rt,
            samples = record.x_coord.len(),
            "trial recorded"
        );

        self.session.data.push(record);
        self.current = None;
        self.trial_number += 1;
        self.next_trial();
        true
    }

    fn background(&mut self) {
        self.current = None;
        self.bindings.clear();
        self.form.clear();
        info!(trials = self.session.data.len(), "trials complete, asking background");
        self.show(View::Background);
    }

    fn end(&mut self) {
        self.session.background = self.form.answers().clone();
        let delay = self.config.submit_delay().as_nanos() as u64;
        self.submit_at = Some(self.timer.now().saturating_add(delay));
        info!("session finished");
        self.show(View::Finished);
    }

    fn submit(&mut self) -> bool {
        if self.submitted {
            return false;
        }
        match self.submit_at {
            Some(at) if self.timer.now() >= at => {}
            _ => return false,
        }
        self.submitted = true;
        let result = self.session.result();
        if let Err(e) = self.sink.submit(&result) {
            error!("submission failed: {e}");
        }
        true
    }

    /// Submits right away if the session is finished but not yet submitted.
    pub fn submit_now(&mut self) -> bool {
        if self.view != View::Finished || self.submitted {
            return false;
        }
        self.submit_at = Some(self.timer.now());
        self.submit()
    }

    pub fn current_word(&self) -> Option<&str> {
        self.current.as_ref().and_then(Trial::current_word)
    }

    /// The reveal control stays up until the last word is shown.
    pub fn reveal_visible(&self) -> bool {
        self.current.as_ref().is_some_and(|t| {
            matches!(
                t.state,
                TrialState::AwaitingReveal | TrialState::RevealingWords
            )
        })
    }

    pub fn choices_enabled(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|t| self.bindings.is_bound_to(Control::Choice, t.id))
    }

    pub fn label(&self, side: Side) -> &str {
        self.stimuli.label_for(self.plan.layout.resolve(side))
    }

    pub fn form(&self) -> &BackgroundForm {
        &self.form
    }

    pub fn instructions(&self) -> &str {
        &self.stimuli.instructions
    }

    pub fn is_preview(&self) -> bool {
        self.config.preview
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// (1-based trial, total) while on the stage.
    pub fn trial_progress(&self) -> Option<(usize, usize)> {
        self.current
            .as_ref()
            .map(|t| (t.id + 1, self.plan.order.len()))
    }

    pub fn results(&self) -> &[TrialRecord] {
        &self.session.data
    }

    pub fn surface(&self) -> &D {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut D {
        &mut self.surface
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submit::MemorySink;
    use crate::surface::ViewLog;
    use negtrack_core::{ButtonLayout, Polarity, TrialType, Truth};
    use negtrack_timing::ManualTimer;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    type Machine = ExperimentStateMachine<ManualTimer, ViewLog, MemorySink>;

    fn machine_with(types: Vec<TrialType>, layout: ButtonLayout) -> (Machine, ManualTimer) {
        let timer = ManualTimer::new();
        let plan = TrialPlan {
            order: (0..12).collect(),
            types,
            layout,
        };
        let machine = ExperimentStateMachine::with_plan(
            ExperimentConfig::default(),
            StimulusSet::no_context(),
            plan,
            timer.clone(),
            ViewLog::default(),
            MemorySink::default(),
        )
        .unwrap();
        (machine, timer)
    }

    fn random_machine(seed: u64) -> (Machine, ManualTimer) {
        let timer = ManualTimer::new();
        let mut rng = StdRng::seed_from_u64(seed);
        let machine = ExperimentStateMachine::new(
            ExperimentConfig::default(),
            StimulusSet::no_context(),
            timer.clone(),
            &mut rng,
            ViewLog::default(),
            MemorySink::default(),
        )
        .unwrap();
        (machine, timer)
    }

    fn reveal_all(machine: &mut Machine, timer: &ManualTimer) {
        while machine.reveal_visible() {
            timer.advance_ms(200);
            assert!(machine.handle_event(ExperimentEvent::Reveal));
        }
    }

    fn run_trial(machine: &mut Machine, timer: &ManualTimer, side: Side) {
        reveal_all(machine, timer);
        for step in 0..5 {
            timer.advance_ms(30);
            machine.handle_event(ExperimentEvent::CursorMoved {
                x: 400.0,
                y: 500.0 - step as f64 * 50.0,
            });
        }
        timer.advance_ms(100);
        assert!(machine.handle_event(ExperimentEvent::Choose(side)));
    }

    fn answer_background(machine: &mut Machine) {
        for event in [
            ExperimentEvent::SelectOption(0),
            ExperimentEvent::SubmitAnswer,
            ExperimentEvent::SelectOption(1),
            ExperimentEvent::SubmitAnswer,
            ExperimentEvent::TypeChar('E'),
            ExperimentEvent::TypeChar('N'),
            ExperimentEvent::SubmitAnswer,
            ExperimentEvent::SelectOption(1),
            ExperimentEvent::SubmitAnswer,
            ExperimentEvent::SubmitAnswer,
        ] {
            assert!(machine.handle_event(event));
        }
    }

    #[test]
    fn pillow_true_positive_answered_true_is_correct() {
        let (mut m, timer) =
            machine_with(vec![TrialType::TruePositive; 12], ButtonLayout::TRUE_LEFT);
        m.handle_event(ExperimentEvent::Start);
        run_trial(&mut m, &timer, Side::Left);

        let record = &m.results()[0];
        assert_eq!(record.item, "pillow");
        assert_eq!(record.sentence, vec!["a", "pillow", "is", "soft"]);
        assert_eq!(record.truth, Truth::True);
        assert_eq!(record.selection, Truth::True);
        assert_eq!(record.correct, 1);
        assert_eq!(record.polarity, Polarity::Pos);
        assert_eq!(record.condition, "no context");
        assert_eq!(record.rt, 250);
    }

    #[test]
    fn pillow_false_negative_answered_true_is_incorrect() {
        let (mut m, timer) =
            machine_with(vec![TrialType::FalseNegative; 12], ButtonLayout::TRUE_LEFT);
        m.handle_event(ExperimentEvent::Start);
        run_trial(&mut m, &timer, Side::Left);

        let record = &m.results()[0];
        assert_eq!(record.sentence, vec!["a", "pillow", "is", "not", "soft"]);
        assert_eq!(record.truth, Truth::False);
        assert_eq!(record.selection, Truth::True);
        assert_eq!(record.correct, 0);
        assert_eq!(record.polarity, Polarity::Neg);
    }

    #[test]
    fn left_control_resolves_through_layout() {
        let (mut m, timer) =
            machine_with(vec![TrialType::TruePositive; 12], ButtonLayout::FALSE_LEFT);
        assert_eq!(m.label(Side::Left), "FALSE");
        m.handle_event(ExperimentEvent::Start);
        run_trial(&mut m, &timer, Side::Left);
        let record = &m.results()[0];
        assert_eq!(record.left_side, Truth::False);
        assert_eq!(record.selection, Truth::False);
        assert_eq!(record.correct, 0);
    }

    #[test]
    fn all_trials_lead_to_background_exactly_once() {
        let (mut m, timer) = random_machine(3);
        m.handle_event(ExperimentEvent::Start);
        for i in 0..12 {
            assert_eq!(m.view, View::Stage);
            run_trial(&mut m, &timer, if i % 2 == 0 { Side::Left } else { Side::Right });
        }
        assert_eq!(m.view, View::Background);
        assert_eq!(m.surface().times_shown(View::Background), 1);
        assert_eq!(m.results().len(), 12);
        assert!(m.current.is_none());

        // Stray trial input after the last trial changes nothing.
        assert!(!m.handle_event(ExperimentEvent::Reveal));
        assert!(!m.handle_event(ExperimentEvent::Choose(Side::Left)));
        assert_eq!(m.surface().times_shown(View::Background), 1);
    }

    #[test]
    fn completed_list_is_a_permutation() {
        for seed in 0..5 {
            let (mut m, timer) = random_machine(seed);
            m.handle_event(ExperimentEvent::Start);
            for _ in 0..12 {
                run_trial(&mut m, &timer, Side::Right);
            }
            let mut completed = m.session.completed.clone();
            assert_eq!(completed, m.plan.order);
            completed.sort_unstable();
            assert_eq!(completed, (0..12).collect::<Vec<_>>());
            assert!(m.session.trials.is_empty());
        }
    }

    #[test]
    fn every_record_is_consistent() {
        let (mut m, timer) = random_machine(11);
        m.handle_event(ExperimentEvent::Start);
        for i in 0..12 {
            run_trial(&mut m, &timer, if i % 3 == 0 { Side::Left } else { Side::Right });
        }
        for record in m.results() {
            assert_eq!(record.correct == 1, record.selection == record.truth);
            assert_eq!(record.read_time.len(), record.sentence.len());
            assert_eq!(record.x_coord.len(), record.coord_timing.len());
        }
    }

    #[test]
    fn cursor_is_not_sampled_outside_the_decision() {
        let (mut m, timer) =
            machine_with(vec![TrialType::TruePositive; 12], ButtonLayout::TRUE_LEFT);
        m.handle_event(ExperimentEvent::Start);
        assert!(!m.handle_event(ExperimentEvent::CursorMoved { x: 1.0, y: 1.0 }));

        timer.advance_ms(100);
        m.handle_event(ExperimentEvent::Reveal);
        timer.advance_ms(100);
        assert!(!m.handle_event(ExperimentEvent::CursorMoved { x: 1.0, y: 1.0 }));
        assert!(!m.choices_enabled());

        reveal_all(&mut m, &timer);
        assert!(m.choices_enabled());
        timer.advance_ms(40);
        assert!(m.handle_event(ExperimentEvent::CursorMoved { x: 2.0, y: 2.0 }));
        timer.advance_ms(10);
        assert!(!m.handle_event(ExperimentEvent::CursorMoved { x: 3.0, y: 3.0 }));
        timer.advance_ms(60);
        m.handle_event(ExperimentEvent::Choose(Side::Right));

        let record = &m.results()[0];
        assert_eq!(record.x_coord, vec![2.0]);
        assert_eq!(record.coord_timing, vec![40]);
        assert!(record.coord_timing.iter().all(|t| *t <= record.rt));

        // Next trial has not been revealed; moves are ignored again.
        timer.advance_ms(30);
        assert!(!m.handle_event(ExperimentEvent::CursorMoved { x: 9.0, y: 9.0 }));
        assert_eq!(m.current.as_ref().map(|t| t.state), Some(TrialState::AwaitingReveal));
    }

    #[test]
    fn choice_before_full_reveal_is_ignored() {
        let (mut m, timer) =
            machine_with(vec![TrialType::TruePositive; 12], ButtonLayout::TRUE_LEFT);
        m.handle_event(ExperimentEvent::Start);
        timer.advance_ms(100);
        m.handle_event(ExperimentEvent::Reveal);
        assert!(!m.handle_event(ExperimentEvent::Choose(Side::Left)));
        assert!(m.results().is_empty());
        assert_eq!(m.current_word(), Some("a"));
    }

    #[test]
    fn repeated_choice_records_only_once_per_trial() {
        let (mut m, timer) =
            machine_with(vec![TrialType::TruePositive; 12], ButtonLayout::TRUE_LEFT);
        m.handle_event(ExperimentEvent::Start);
        run_trial(&mut m, &timer, Side::Left);
        assert!(!m.handle_event(ExperimentEvent::Choose(Side::Left)));
        assert!(!m.handle_event(ExperimentEvent::Choose(Side::Right)));
        assert_eq!(m.results().len(), 1);
        assert_eq!(m.trial_progress(), Some((2, 12)));
    }

    #[test]
    fn preview_mode_cannot_start() {
        let timer = ManualTimer::new();
        let config = ExperimentConfig {
            preview: true,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let mut m: Machine = ExperimentStateMachine::new(
            config,
            StimulusSet::no_context(),
            timer,
            &mut rng,
            ViewLog::default(),
            MemorySink::default(),
        )
        .unwrap();
        assert!(m.is_preview());
        assert!(!m.handle_event(ExperimentEvent::Start));
        assert_eq!(m.view, View::Instructions);
    }

    #[test]
    fn blank_answer_blocks_background_form() {
        let (mut m, timer) = random_machine(5);
        m.handle_event(ExperimentEvent::Start);
        for _ in 0..12 {
            run_trial(&mut m, &timer, Side::Left);
        }
        assert!(!m.handle_event(ExperimentEvent::SubmitAnswer));
        assert_eq!(m.form().prompt(), Some("Please answer this question."));
        assert_eq!(m.view, View::Background);
    }

    #[test]
    fn result_is_submitted_once_after_delay() {
        let (mut m, timer) = random_machine(9);
        m.handle_event(ExperimentEvent::Start);
        for _ in 0..12 {
            run_trial(&mut m, &timer, Side::Left);
        }
        answer_background(&mut m);
        assert_eq!(m.view, View::Finished);
        assert!(m.update().is_empty());
        assert!(!m.handle_event(ExperimentEvent::SubmissionDue));

        timer.advance_ms(1499);
        assert!(m.update().is_empty());
        timer.advance_ms(1);
        let events = m.update();
        assert_eq!(events, vec![ExperimentEvent::SubmissionDue]);
        for event in events {
            assert!(m.handle_event(event));
        }
        assert!(m.is_submitted());
        assert!(m.update().is_empty());
        assert!(!m.handle_event(ExperimentEvent::SubmissionDue));
        assert!(!m.submit_now());

        let submitted = &m.sink().submissions;
        assert_eq!(submitted.len(), 1);
        let result = &submitted[0];
        assert_eq!(result.data.len(), 12);
        assert_eq!(result.completed.len(), 12);
        assert!(result.trials.is_empty());
        assert_eq!(result.background.gender, "male");
        assert_eq!(result.background.age, "18-24");
        assert_eq!(result.background.native_language, "EN");
        assert_eq!(result.background.mouse, "right");
    }

    #[test]
    fn submit_now_skips_the_delay() {
        let (mut m, timer) = random_machine(2);
        assert!(!m.submit_now());
        m.handle_event(ExperimentEvent::Start);
        for _ in 0..12 {
            run_trial(&mut m, &timer, Side::Right);
        }
        answer_background(&mut m);
        assert!(m.submit_now());
        assert_eq!(m.sink().submissions.len(), 1);
    }

    #[test]
    fn context_variant_reveals_preamble_then_target() {
        let timer = ManualTimer::new();
        let plan = TrialPlan {
            order: (0..12).collect(),
            types: vec![TrialType::TruePositive; 12],
            layout: ButtonLayout::TRUE_LEFT,
        };
        let mut m: Machine = ExperimentStateMachine::with_plan(
            ExperimentConfig::default(),
            StimulusSet::context(),
            plan,
            timer.clone(),
            ViewLog::default(),
            MemorySink::default(),
        )
        .unwrap();
        assert_eq!(m.label(Side::Left), "sensible");
        m.handle_event(ExperimentEvent::Start);
        run_trial(&mut m, &timer, Side::Left);
        let record = &m.results()[0];
        assert_eq!(record.sentence.len(), 7 + 3);
        assert_eq!(record.sentence[0], "\"Flying");
        assert_eq!(record.sentence[9], "wheels\"");
        assert_eq!(record.read_time.len(), 10);
        assert_eq!(record.selection, Truth::True);
        assert_eq!(record.condition, "context");
    }

    #[test]
    fn mismatched_plan_is_rejected() {
        let plan = TrialPlan {
            order: (0..11).collect(),
            types: vec![TrialType::TruePositive; 11],
            layout: ButtonLayout::TRUE_LEFT,
        };
        let result: Result<Machine> = ExperimentStateMachine::with_plan(
            ExperimentConfig::default(),
            StimulusSet::no_context(),
            plan,
            ManualTimer::new(),
            ViewLog::default(),
            MemorySink::default(),
        );
        assert!(result.is_err());
    }
}
