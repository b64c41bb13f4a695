use crate::background::BackgroundAnswers;
use negtrack_core::{ButtonLayout, Error, Result, TrialRecord, TrialSpec, TrialType, Truth};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Everything randomized once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialPlan {
    /// Item indices in presentation order.
    pub order: Vec<usize>,
    /// Trial type for each item, indexed by item.
    pub types: Vec<TrialType>,
    pub layout: ButtonLayout,
}

impl TrialPlan {
    /// Shuffled order, balanced shuffled types and a random side for TRUE.
    pub fn random<R: Rng + ?Sized>(items: usize, rng: &mut R) -> Self {
        let layout = ButtonLayout::random(rng);
        let mut types: Vec<TrialType> = (0..items).map(|i| TrialType::ALL[i % 4]).collect();
        types.shuffle(rng);
        let mut order: Vec<usize> = (0..items).collect();
        order.shuffle(rng);
        Self {
            order,
            types,
            layout,
        }
    }

    /// The order must be a permutation of `0..items` and every item needs a type.
    pub fn validate(&self, items: usize) -> Result<()> {
        if self.types.len() != items {
            return Err(Error::Config(format!(
                "plan has {} trial types for {items} items",
                self.types.len()
            )));
        }
        let mut seen = vec![false; items];
        for &item in &self.order {
            match seen.get_mut(item) {
                Some(slot) if !*slot => *slot = true,
                Some(_) => {
                    return Err(Error::Config(format!("item {item} appears twice in order")));
                }
                None => return Err(Error::ItemOutOfRange { index: item, len: items }),
            }
        }
        if self.order.len() != items {
            return Err(Error::Config(format!(
                "order covers {} of {items} items",
                self.order.len()
            )));
        }
        Ok(())
    }

    pub fn spec(&self, item: usize) -> Option<TrialSpec> {
        self.types.get(item).map(|&trial_type| TrialSpec { item, trial_type })
    }
}

/// Session-wide accumulator owned by the sequencer.
#[derive(Debug, Clone)]
pub struct Session {
    pub trials: VecDeque<usize>,
    pub completed: Vec<usize>,
    pub left_side: Truth,
    pub data: Vec<TrialRecord>,
    pub background: BackgroundAnswers,
}

impl Session {
    pub fn new(plan: &TrialPlan) -> Self {
        Self {
            trials: plan.order.iter().copied().collect(),
            completed: Vec::with_capacity(plan.order.len()),
            left_side: plan.layout.left,
            data: Vec::with_capacity(plan.order.len()),
            background: BackgroundAnswers::default(),
        }
    }

    /// Takes the next item off the queue and notes it as completed.
    pub fn next_item(&mut self) -> Option<usize> {
        let item = self.trials.pop_front()?;
        self.completed.push(item);
        Some(item)
    }

    pub fn result(&self) -> SessionResult {
        SessionResult {
            trials: self.trials.iter().copied().collect(),
            completed: self.completed.clone(),
            left_side: self.left_side,
            data: self.data.clone(),
            background: self.background.clone(),
        }
    }
}

/// The object handed to the submission sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResult {
    pub trials: Vec<usize>,
    pub completed: Vec<usize>,
    pub left_side: Truth,
    pub data: Vec<TrialRecord>,
    #[serde(flatten)]
    pub background: BackgroundAnswers,
}
