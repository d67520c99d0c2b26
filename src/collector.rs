//! Step-by-step accumulation of quiz answers.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{
    AnswerOption, ChargerType, ChargingFrequency, ElectricalSystem, PropertyType, QuizAnswers,
    Timeline,
};

/// The quiz questions, in the order they are asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum QuizStep {
    ElectricalSystem = 1,
    ChargingFrequency = 2,
    ChargerType = 3,
    PropertyType = 4,
    Panel = 5,
    Timeline = 6,
}

impl QuizStep {
    pub const TOTAL: u32 = 6;

    pub fn number(self) -> u32 {
        self as u32
    }

    pub fn from_number(number: u32) -> Option<Self> {
        match number {
            1 => Some(Self::ElectricalSystem),
            2 => Some(Self::ChargingFrequency),
            3 => Some(Self::ChargerType),
            4 => Some(Self::PropertyType),
            5 => Some(Self::Panel),
            6 => Some(Self::Timeline),
            _ => None,
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        Self::from_number(self.number().saturating_sub(1))
    }
}

/// One step's worth of input, as posted by the quiz front-end.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum StepAnswer {
    ElectricalSystem {
        value: String,
    },
    ChargingFrequency {
        value: String,
    },
    ChargerType {
        value: String,
    },
    PropertyType {
        value: String,
        #[serde(default, rename = "garageType")]
        garage_type: Option<String>,
    },
    Panel {
        #[serde(default, rename = "currentPanel")]
        current_panel: Option<String>,
        #[serde(default)]
        zip: Option<String>,
    },
    Timeline {
        value: String,
    },
}

impl StepAnswer {
    pub fn step(&self) -> QuizStep {
        match self {
            StepAnswer::ElectricalSystem { .. } => QuizStep::ElectricalSystem,
            StepAnswer::ChargingFrequency { .. } => QuizStep::ChargingFrequency,
            StepAnswer::ChargerType { .. } => QuizStep::ChargerType,
            StepAnswer::PropertyType { .. } => QuizStep::PropertyType,
            StepAnswer::Panel { .. } => QuizStep::Panel,
            StepAnswer::Timeline { .. } => QuizStep::Timeline,
        }
    }
}

/// Result of moving forward from the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next(QuizStep),
    /// The last step was already showing; the quiz is ready to be finished.
    Complete,
}

/// Accumulates answers one step at a time until the quiz is finished.
///
/// Once [`AnswerCollector::finish`] has been called the answers are frozen and
/// any further `record` is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerCollector {
    step: QuizStep,
    answers: QuizAnswers,
    frozen: bool,
}

impl Default for AnswerCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl AnswerCollector {
    pub fn new() -> Self {
        Self::with_answers(QuizAnswers::default())
    }

    /// Resumes a quiz from previously saved answers, starting at step 1.
    pub fn with_answers(answers: QuizAnswers) -> Self {
        Self {
            step: QuizStep::ElectricalSystem,
            answers,
            frozen: false,
        }
    }

    pub fn current_step(&self) -> QuizStep {
        self.step
    }

    pub fn answers(&self) -> &QuizAnswers {
        &self.answers
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Percentage of the quiz reached, rounded to the nearest whole number.
    pub fn progress(&self) -> u32 {
        (self.step.number() * 100 + QuizStep::TOTAL / 2) / QuizStep::TOTAL
    }

    /// Stores the answer in its field. Answers are keyed by field, so
    /// revisiting an earlier step simply overwrites it.
    pub fn record(&mut self, answer: StepAnswer) -> Result<(), AppError> {
        if self.frozen {
            return Err(AppError::Conflict(
                "Quiz already completed; answers are read-only".to_string(),
            ));
        }

        let answers = &mut self.answers;
        match answer {
            StepAnswer::ElectricalSystem { value } => {
                answers.electrical_system = ElectricalSystem::from_label(&value);
            }
            StepAnswer::ChargingFrequency { value } => {
                answers.charging_frequency = ChargingFrequency::from_label(&value);
            }
            StepAnswer::ChargerType { value } => {
                answers.charger_type = ChargerType::from_label(&value);
            }
            StepAnswer::PropertyType { value, garage_type } => {
                answers.property_type = PropertyType::from_label(&value);
                if let Some(garage) = garage_type {
                    answers.garage_type = garage.trim().to_string();
                }
            }
            StepAnswer::Panel {
                current_panel,
                zip,
            } => {
                if let Some(panel) = current_panel {
                    answers.current_panel = panel.trim().to_string();
                }
                if let Some(zip) = zip {
                    answers.zip = zip.trim().to_string();
                }
            }
            StepAnswer::Timeline { value } => {
                answers.timeline = Timeline::from_label(&value);
            }
        }
        Ok(())
    }

    pub fn advance(&mut self) -> Advance {
        match self.step.next() {
            Some(next) => {
                self.step = next;
                Advance::Next(next)
            }
            None => Advance::Complete,
        }
    }

    /// Goes back one step; stays on the first step.
    pub fn back(&mut self) -> QuizStep {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    /// Freezes the collector and hands out the final answers.
    pub fn finish(&mut self) -> QuizAnswers {
        self.frozen = true;
        self.answers.clone()
    }
}
