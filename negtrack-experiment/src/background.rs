//! Background questionnaire shown once all trials are done.
//!
//! Questions are answered one at a time. A required question left blank keeps
//! the form on that question and sets the prompt the participant sees.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const GENDER_OPTIONS: &[&str] = &["male", "female", "other"];
pub const AGE_OPTIONS: &[&str] = &[
    "under 18", "18-24", "25-34", "35-44", "45-54", "55-64", "65 or over",
];
pub const MOUSE_OPTIONS: &[&str] = &["left", "right"];

const MAX_TEXT_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Question {
    Gender,
    Age,
    NativeLanguage,
    Mouse,
    Comments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    Choice(&'static [&'static str]),
    Text { required: bool },
}

impl Question {
    pub const ALL: [Question; 5] = [
        Question::Gender,
        Question::Age,
        Question::NativeLanguage,
        Question::Mouse,
        Question::Comments,
    ];

    pub fn prompt(&self) -> &'static str {
        match self {
            Question::Gender => "What is your gender?",
            Question::Age => "What is your age?",
            Question::NativeLanguage => "What is your native language?",
            Question::Mouse => "Which hand do you use the mouse with?",
            Question::Comments => "Any comments about this study? (optional)",
        }
    }

    pub fn kind(&self) -> AnswerKind {
        match self {
            Question::Gender => AnswerKind::Choice(GENDER_OPTIONS),
            Question::Age => AnswerKind::Choice(AGE_OPTIONS),
            Question::Mouse => AnswerKind::Choice(MOUSE_OPTIONS),
            Question::NativeLanguage => AnswerKind::Text { required: true },
            Question::Comments => AnswerKind::Text { required: false },
        }
    }

    pub fn options(&self) -> &'static [&'static str] {
        match self.kind() {
            AnswerKind::Choice(options) => options,
            AnswerKind::Text { .. } => &[],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundAnswers {
    pub gender: String,
    pub age: String,
    pub native_language: String,
    pub mouse: String,
    pub comments: String,
}

impl BackgroundAnswers {
    fn set(&mut self, question: Question, value: String) {
        let slot = match question {
            Question::Gender => &mut self.gender,
            Question::Age => &mut self.age,
            Question::NativeLanguage => &mut self.native_language,
            Question::Mouse => &mut self.mouse,
            Question::Comments => &mut self.comments,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{prompt}")]
pub struct ValidationError {
    pub question: Question,
    pub prompt: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormStep {
    Next(Question),
    Complete,
}

#[derive(Debug, Clone, Default)]
pub struct BackgroundForm {
    step: usize,
    selected: Option<usize>,
    text: String,
    prompt: Option<&'static str>,
    answers: BackgroundAnswers,
}

impl BackgroundForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets every answer and goes back to the first question.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn current(&self) -> Option<Question> {
        Question::ALL.get(self.step).copied()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn prompt(&self) -> Option<&'static str> {
        self.prompt
    }

    pub fn answers(&self) -> &BackgroundAnswers {
        &self.answers
    }

    pub fn select(&mut self, option: usize) -> bool {
        match self.current().map(|q| q.kind()) {
            Some(AnswerKind::Choice(options)) if option < options.len() => {
                self.selected = Some(option);
                self.prompt = None;
                true
            }
            _ => false,
        }
    }

    pub fn type_char(&mut self, c: char) -> bool {
        let accepts_text = matches!(
            self.current().map(|q| q.kind()),
            Some(AnswerKind::Text { .. })
        );
        if !accepts_text || c.is_control() || self.text.chars().count() >= MAX_TEXT_LEN {
            return false;
        }
        self.text.push(c);
        self.prompt = None;
        true
    }

    pub fn backspace(&mut self) -> bool {
        self.text.pop().is_some()
    }

    /// Stores the current answer and moves on, or refuses with the prompt to show.
    pub fn submit(&mut self) -> Result<FormStep, ValidationError> {
        let Some(question) = self.current() else {
            return Ok(FormStep::Complete);
        };
        let answer = match question.kind() {
            AnswerKind::Choice(options) => match self.selected.and_then(|i| options.get(i)) {
                Some(value) => value.to_string(),
                None => return Err(self.reject(question, "Please answer this question.")),
            },
            AnswerKind::Text { required } => {
                let value = self.text.trim().to_string();
                if required && value.is_empty() {
                    return Err(self.reject(question, "Please answer all the questions."));
                }
                value
            }
        };
        self.answers.set(question, answer);
        self.step += 1;
        self.selected = None;
        self.text.clear();
        self.prompt = None;
        Ok(self.current().map_or(FormStep::Complete, FormStep::Next))
    }

    fn reject(&mut self, question: Question, prompt: &'static str) -> ValidationError {
        self.prompt = Some(prompt);
        ValidationError { question, prompt }
    }
}
