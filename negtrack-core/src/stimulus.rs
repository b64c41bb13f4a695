use crate::error::{Error, Result};
use crate::trial::{TrialSpec, Truth};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Built-in experiment variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    #[default]
    NoContext,
    Context,
}

impl Variant {
    pub fn stimulus_set(&self) -> StimulusSet {
        match self {
            Variant::NoContext => StimulusSet::no_context(),
            Variant::Context => StimulusSet::context(),
        }
    }
}

impl std::str::FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "no-context" => Ok(Variant::NoContext),
            "context" => Ok(Variant::Context),
            other => Err(Error::Config(format!("unknown variant `{other}`"))),
        }
    }
}

/// A concept with its four candidate sentences, in `TrialType` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    #[serde(default)]
    pub preamble: Vec<String>,
    pub sentences: [Vec<String>; 4],
}

/// Text shown on the TRUE and FALSE controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceLabels {
    #[serde(rename = "true")]
    pub truth: String,
    #[serde(rename = "false")]
    pub falsity: String,
}

impl Default for ChoiceLabels {
    fn default() -> Self {
        Self {
            truth: "TRUE".into(),
            falsity: "FALSE".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StimulusSet {
    pub condition: String,
    #[serde(default)]
    pub labels: ChoiceLabels,
    #[serde(default)]
    pub instructions: String,
    pub items: Vec<Item>,
}

impl StimulusSet {
    pub fn from_json(json: &str) -> Result<Self> {
        let set: StimulusSet = serde_json::from_str(json)?;
        set.validate()?;
        Ok(set)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(Error::Stimulus("set has no items".into()));
        }
        for item in &self.items {
            if let Some(idx) = item.sentences.iter().position(|s| s.is_empty()) {
                return Err(Error::Stimulus(format!(
                    "item `{}` has an empty sentence at index {idx}",
                    item.name
                )));
            }
            if item
                .preamble
                .iter()
                .chain(item.sentences.iter().flatten())
                .any(|w| w.trim().is_empty())
            {
                return Err(Error::Stimulus(format!(
                    "item `{}` contains a blank word",
                    item.name
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, index: usize) -> Result<&Item> {
        self.items.get(index).ok_or(Error::ItemOutOfRange {
            index,
            len: self.items.len(),
        })
    }

    /// Tokens displayed for a trial: preamble followed by the target sentence.
    pub fn sentence(&self, spec: &TrialSpec) -> Result<Vec<String>> {
        let item = self.item(spec.item)?;
        Ok(item
            .preamble
            .iter()
            .chain(&item.sentences[spec.trial_type.index()])
            .cloned()
            .collect())
    }

    pub fn label_for(&self, truth: Truth) -> &str {
        match truth {
            Truth::True => &self.labels.truth,
            Truth::False => &self.labels.falsity,
        }
    }

    /// Every word the set can display.
    pub fn vocabulary(&self) -> impl Iterator<Item = &str> {
        self.items
            .iter()
            .flat_map(|i| i.preamble.iter().chain(i.sentences.iter().flatten()))
            .map(String::as_str)
    }

    pub fn no_context() -> Self {
        let items = NO_CONTEXT_ITEMS
            .iter()
            .map(|(name, sentences)| item(name, &[], sentences))
            .collect();
        Self {
            condition: "no context".into(),
            labels: ChoiceLabels::default(),
            instructions: NO_CONTEXT_INSTRUCTIONS.into(),
            items,
        }
    }

    pub fn context() -> Self {
        let items = CONTEXT_ITEMS
            .iter()
            .map(|(name, preamble, sentences)| item(name, preamble, sentences))
            .collect();
        Self {
            condition: "context".into(),
            labels: ChoiceLabels {
                truth: "sensible".into(),
                falsity: "nonsense".into(),
            },
            instructions: CONTEXT_INSTRUCTIONS.into(),
            items,
        }
    }
}

fn words(ws: &[&str]) -> Vec<String> {
    ws.iter().map(|w| w.to_string()).collect()
}

fn item(name: &str, preamble: &[&str], sentences: &[&[&str]; 4]) -> Item {
    Item {
        name: name.to_string(),
        preamble: words(preamble),
        sentences: (*sentences).map(|s| words(s)),
    }
}

type Sentences = [&'static [&'static str]; 4];

const NO_CONTEXT_INSTRUCTIONS: &str = "Thank you for taking part in this brief study. \
On the next pages you will see \"TRUE\" and \"FALSE\" boxes at the top of the screen and a black circle at the bottom. \
Clicking the circle reveals a simple sentence one word at a time. When the sentence is complete the circle disappears. \
Then click the \"TRUE\" or \"FALSE\" box with your mouse. For example, \"houses are buildings\" is TRUE and \"houses are not buildings\" is FALSE. \
Click start to begin.";

const CONTEXT_INSTRUCTIONS: &str = "Thank you for taking part in this brief study. \
On the next pages you will see \"sensible\" and \"nonsense\" at the top of the screen and a black circle at the bottom. \
Clicking the circle reveals a short statement from an adult to a child, one word at a time. When the statement is complete the circle disappears. \
Then click the box that says whether the statement is \"sensible\" or \"nonsense\". For example, \"Billy, a pillow is soft.\" is sensible and \"Son, pillows are hard.\" is nonsense. \
Click start to begin.";

const NO_CONTEXT_ITEMS: [(&str, Sentences); 12] = [
    (
        "pillow",
        [
            &["a", "pillow", "is", "soft"],
            &["a", "pillow", "is", "hard"],
            &["a", "pillow", "is", "not", "hard"],
            &["a", "pillow", "is", "not", "soft"],
        ],
    ),
    (
        "circles",
        [
            &["circles", "are", "shapes"],
            &["circles", "are", "squares"],
            &["circles", "are", "not", "squares"],
            &["circles", "are", "not", "shapes"],
        ],
    ),
    (
        "pants",
        [
            &["pants", "have", "legs"],
            &["pants", "have", "arms"],
            &["pants", "have", "no", "arms"],
            &["pants", "have", "no", "legs"],
        ],
    ),
    (
        "people",
        [
            &["people", "ride", "bikes"],
            &["people", "fly", "bikes"],
            &["people", "never", "fly", "bikes"],
            &["people", "never", "ride", "bikes"],
        ],
    ),
    (
        "phones",
        [
            &["phones", "are", "dialed"],
            &["phones", "are", "eaten"],
            &["phones", "are", "not", "eaten"],
            &["phones", "are", "not", "dialed"],
        ],
    ),
    (
        "sky",
        [
            &["the", "sky", "is", "blue"],
            &["the", "sky", "is", "green"],
            &["the", "sky", "is", "not", "green"],
            &["the", "sky", "is", "not", "blue"],
        ],
    ),
    (
        "bear",
        [
            &["a", "bear", "is", "large"],
            &["a", "bear", "is", "small"],
            &["a", "bear", "is", "not", "small"],
            &["a", "bear", "is", "not", "large"],
        ],
    ),
    (
        "grass",
        [
            &["grass", "is", "green"],
            &["grass", "is", "blue"],
            &["grass", "is", "not", "blue"],
            &["grass", "is", "not", "green"],
        ],
    ),
    (
        "ground",
        [
            &["the", "ground", "is", "below"],
            &["the", "ground", "is", "above"],
            &["the", "ground", "is", "not", "above"],
            &["the", "ground", "is", "not", "below"],
        ],
    ),
    (
        "secrets",
        [
            &["secrets", "are", "private"],
            &["secrets", "are", "public"],
            &["secrets", "are", "not", "public"],
            &["secrets", "are", "not", "private"],
        ],
    ),
    (
        "fire",
        [
            &["a", "fire", "is", "hot"],
            &["a", "fire", "is", "cold"],
            &["a", "fire", "is", "not", "cold"],
            &["a", "fire", "is", "not", "hot"],
        ],
    ),
    (
        "rocket",
        [
            &["a", "rocket", "is", "fast"],
            &["a", "rocket", "is", "slow"],
            &["a", "rocket", "is", "not", "slow"],
            &["a", "rocket", "is", "not", "fast"],
        ],
    ),
];

const CONTEXT_ITEMS: [(&str, &[&str], Sentences); 12] = [
    (
        "cars",
        &["\"Flying", "cars!?\"", "dad", "said", "to", "his", "son,"],
        [
            &["\"cars", "have", "wheels\""],
            &["\"cars", "have", "wings\""],
            &["\"cars", "have", "no", "wings\""],
            &["\"cars", "have", "no", "wheels\""],
        ],
    ),
    (
        "wrestlers",
        &[
            "\"I", "am", "sure", "the", "wrestler", "can", "lift", "that!\"", "the", "mother",
            "told", "the", "child,",
        ],
        [
            &["\"wrestlers", "are", "strong\""],
            &["\"wrestlers", "are", "weak\""],
            &["\"wrestlers", "are", "not", "weak\""],
            &["\"wrestlers", "are", "not", "strong\""],
        ],
    ),
    (
        "ice",
        &["\"Ice", "in", "the", "bathtub?\"", "mom", "laughed,"],
        [
            &["\"ice", "is", "cold\""],
            &["\"ice", "is", "warm\""],
            &["\"ice", "is", "not", "warm\""],
            &["\"ice", "is", "not", "cold\""],
        ],
    ),
    (
        "dog",
        &[
            "\"A", "dog", "would", "make", "a", "bad", "pitcher\"", "dad", "said", "at", "the",
            "baseball", "game,",
        ],
        [
            &["\"a", "dog", "has", "legs\""],
            &["\"a", "dog", "has", "arms\""],
            &["\"a", "dog", "has", "no", "arms\""],
            &["\"a", "dog", "has", "no", "legs\""],
        ],
    ),
    (
        "earth",
        &[
            "\"Yes", "if", "the", "earth", "were", "a", "cube\"", "the", "teacher", "corrected,",
            "\"but",
        ],
        [
            &["\"the", "earth", "is", "round\""],
            &["\"the", "earth", "is", "square\""],
            &["\"the", "earth", "is", "not", "square\""],
            &["\"the", "earth", "is", "not", "round\""],
        ],
    ),
    (
        "elephants",
        &[
            "\"You", "want", "to", "lift", "an", "elephant?\"", "she", "laughed", "at", "her",
            "daughter,",
        ],
        [
            &["\"elephants", "are", "large\""],
            &["\"elephants", "are", "small\""],
            &["\"elephants", "are", "not", "small\""],
            &["\"elephants", "are", "not", "large\""],
        ],
    ),
    (
        "clouds",
        &["\"Are", "you", "digging", "for", "clouds?\"", "the", "father", "chuckled,"],
        [
            &["\"clouds", "are", "in", "the", "sky\""],
            &["\"clouds", "are", "in", "the", "ground\""],
            &["\"clouds", "are", "not", "in", "the", "ground\""],
            &["\"clouds", "are", "not", "in", "the", "sky\""],
        ],
    ),
    (
        "rose",
        &[
            "\"Roses", "and", "violets", "are", "different\"", "the", "mother", "told", "her",
            "son,",
        ],
        [
            &["\"roses", "are", "red\""],
            &["\"roses", "are", "blue\""],
            &["\"roses", "are", "not", "blue\""],
            &["\"roses", "are", "not", "red\""],
        ],
    ),
    (
        "elastics",
        &[
            "\"Of", "course", "elastics", "are", "good", "for", "your", "pajamas\"", "mom",
            "said,",
        ],
        [
            &["\"elastics", "are", "stretchy\""],
            &["\"elastics", "are", "rigid\""],
            &["\"elastics", "are", "not", "rigid\""],
            &["\"elastics", "are", "not", "stretchy\""],
        ],
    ),
    (
        "bananas",
        &[
            "\"Ripe", "bananas", "come", "in", "one", "color!\"", "the", "father", "taught",
            "the", "child,",
        ],
        [
            &["\"bananas", "are", "yellow\""],
            &["\"bananas", "are", "purple\""],
            &["\"bananas", "are", "not", "purple\""],
            &["\"bananas", "are", "not", "yellow\""],
        ],
    ),
    (
        "trees",
        &[
            "\"Only", "in", "stories", "can", "you", "walk", "inside", "a", "tree\"", "the",
            "parent", "corrected,",
        ],
        [
            &["\"trees", "have", "trunks\""],
            &["\"trees", "have", "doors\""],
            &["\"trees", "have", "no", "doors\""],
            &["\"trees", "have", "no", "trunks\""],
        ],
    ),
    (
        "pen",
        &[
            "\"Eating", "the", "pen's", "black", "fluid", "is", "dangerous\"", "mommy",
            "warned,",
        ],
        [
            &["\"pens", "contain", "ink\""],
            &["\"pens", "contain", "food\""],
            &["\"pens", "contain", "no", "food\""],
            &["\"pens", "contain", "no", "ink\""],
        ],
    ),
];
