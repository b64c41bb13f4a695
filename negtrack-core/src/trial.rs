use rand::Rng;
use serde::{Deserialize, Serialize};

/// Per-trial state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrialState {
    #[default]
    AwaitingReveal,
    RevealingWords,
    AwaitingChoice,
    Recorded,
}

/// Experimentally correct judgment for a sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Truth {
    #[serde(rename = "TRUE")]
    True,
    #[serde(rename = "FALSE")]
    False,
}

impl Truth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Truth::True => "TRUE",
            Truth::False => "FALSE",
        }
    }
}

impl std::fmt::Display for Truth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the target sentence is a plain or a negated statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Pos,
    Neg,
}

/// Index into an item's four sentences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum TrialType {
    TruePositive = 0,
    FalsePositive = 1,
    TrueNegative = 2,
    FalseNegative = 3,
}

impl TrialType {
    pub const ALL: [TrialType; 4] = [
        TrialType::TruePositive,
        TrialType::FalsePositive,
        TrialType::TrueNegative,
        TrialType::FalseNegative,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn truth(&self) -> Truth {
        match self {
            TrialType::TruePositive | TrialType::TrueNegative => Truth::True,
            TrialType::FalsePositive | TrialType::FalseNegative => Truth::False,
        }
    }

    pub fn polarity(&self) -> Polarity {
        match self {
            TrialType::TruePositive | TrialType::FalsePositive => Polarity::Pos,
            TrialType::TrueNegative | TrialType::FalseNegative => Polarity::Neg,
        }
    }
}

impl From<TrialType> for u8 {
    fn from(t: TrialType) -> Self {
        t as u8
    }
}

impl TryFrom<u8> for TrialType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        TrialType::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| format!("trial type must be 0-3, got {value}"))
    }
}

/// (item, type) pair naming one trial's sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialSpec {
    pub item: usize,
    pub trial_type: TrialType,
}

impl TrialSpec {
    pub fn truth(&self) -> Truth {
        self.trial_type.truth()
    }

    pub fn polarity(&self) -> Polarity {
        self.trial_type.polarity()
    }
}

/// Screen side of a choice control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Which side shows TRUE and which FALSE, fixed for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonLayout {
    pub left: Truth,
    pub right: Truth,
}

impl ButtonLayout {
    pub const TRUE_LEFT: ButtonLayout = ButtonLayout {
        left: Truth::True,
        right: Truth::False,
    };
    pub const FALSE_LEFT: ButtonLayout = ButtonLayout {
        left: Truth::False,
        right: Truth::True,
    };

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.random_bool(0.5) {
            Self::TRUE_LEFT
        } else {
            Self::FALSE_LEFT
        }
    }

    /// Value selected by clicking the control on `side`.
    pub fn resolve(&self, side: Side) -> Truth {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

/// Recorded result per trial. Field names are kept stable for analysis scripts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialRecord {
    pub left_side: Truth,
    pub item: String,
    pub sentence: Vec<String>,
    pub truth: Truth,
    #[serde(rename = "type")]
    pub polarity: Polarity,
    pub selection: Truth,
    pub correct: u8,
    pub x_coord: Vec<f64>,
    pub y_coord: Vec<f64>,
    pub coord_timing: Vec<u64>,
    pub rt: u64,
    pub read_time: Vec<u64>,
    /// Reading time for all but the final word; add `rt` for reveal-to-decision time.
    pub total_read_time: u64,
    pub condition: String,
}
