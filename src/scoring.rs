//! Installation complexity scoring and cost estimation.
//!
//! Points and dollars come from a single weight table: each scored answer
//! maps to one [`Weight`] carrying both. The score, the dollar estimate and
//! the maximum attainable score are all folds over that table, so the three
//! can never drift apart.

use serde::{Deserialize, Serialize};

use crate::models::{
    AnswerOption, ChargerType, ChargingFrequency, ElectricalSystem, PropertyType, QuizAnswers,
};

/// Starting point of every estimate (basic Level 2 installation labor).
pub const BASE_INSTALLATION_COST: u32 = 800;
pub const MIN_INSTALLATION_COST: u32 = 800;
pub const MAX_INSTALLATION_COST: u32 = 8000;
pub const COST_ROUNDING_STEP: u32 = 50;

const COMPLEX_TIER_THRESHOLD: u32 = 8;
const STANDARD_TIER_THRESHOLD: u32 = 4;

/// Contribution of a single answer to the score and to the dollar estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Weight {
    pub points: u32,
    pub dollars: u32,
}

impl Weight {
    const fn new(points: u32, dollars: u32) -> Self {
        Self { points, dollars }
    }
}

/// An answer option that participates in scoring.
pub trait Weighted: AnswerOption {
    fn weight(self) -> Weight;
}

impl Weighted for ElectricalSystem {
    fn weight(self) -> Weight {
        match self {
            Self::UnderTenYears => Weight::new(0, 0),
            Self::TenToTwentyYears => Weight::new(1, 0),
            Self::TwentyToThirtyYears => Weight::new(2, 200),
            Self::ThirtyPlusOrUnsure => Weight::new(3, 500),
        }
    }
}

impl Weighted for ChargingFrequency {
    fn weight(self) -> Weight {
        match self {
            Self::Planning => Weight::new(0, 0),
            Self::FewTimesAWeek => Weight::new(1, 0),
            Self::DailyCommuting => Weight::new(2, 0),
            // Both heavy-usage buckets carry the same surcharge.
            Self::MultipleTimesDaily => Weight::new(3, 400),
            Self::CommercialFleet => Weight::new(4, 400),
        }
    }
}

impl Weighted for ChargerType {
    fn weight(self) -> Weight {
        match self {
            Self::Level1 => Weight::new(0, 0),
            Self::Level2 => Weight::new(2, 400),
            Self::Level3 => Weight::new(4, 2500),
            Self::Unsure => Weight::new(1, 200),
        }
    }
}

impl Weighted for PropertyType {
    fn weight(self) -> Weight {
        match self {
            Self::SingleFamily => Weight::new(0, 0),
            Self::TownhouseCondo => Weight::new(1, 300),
            Self::Apartment => Weight::new(2, 800),
            Self::Commercial => Weight::new(3, 1500),
        }
    }
}

/// Installation complexity bucket derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Tier {
    Simple = 1,
    Standard = 2,
    Complex = 3,
}

impl Tier {
    pub fn from_score(score: u32) -> Self {
        if score >= COMPLEX_TIER_THRESHOLD {
            Tier::Complex
        } else if score >= STANDARD_TIER_THRESHOLD {
            Tier::Standard
        } else {
            Tier::Simple
        }
    }

    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Tier::Simple => "simple",
            Tier::Standard => "standard",
            Tier::Complex => "complex",
        }
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> Self {
        tier.level()
    }
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Tier::Simple),
            2 => Ok(Tier::Standard),
            3 => Ok(Tier::Complex),
            other => Err(format!("tier must be 1, 2 or 3 (got {})", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizScore {
    pub score: u32,
    pub tier: Tier,
}

/// Everything the results page shows about a set of answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteEstimate {
    pub score: u32,
    pub tier: Tier,
    /// Score as a share of the maximum attainable score, 0..=100.
    pub percent: u32,
    pub installation_cost: u32,
}

fn weight_of<T: Weighted>(answer: Option<T>) -> Weight {
    answer.map(T::weight).unwrap_or_default()
}

fn max_points<T: Weighted>() -> u32 {
    T::ALL
        .iter()
        .map(|option| option.weight().points)
        .max()
        .unwrap_or(0)
}

/// Weights of the four scored answers. Unset answers weigh nothing.
pub fn answer_weights(answers: &QuizAnswers) -> [Weight; 4] {
    [
        weight_of(answers.electrical_system),
        weight_of(answers.charging_frequency),
        weight_of(answers.charger_type),
        weight_of(answers.property_type),
    ]
}

/// Highest score any combination of answers can reach.
pub fn max_score() -> u32 {
    max_points::<ElectricalSystem>()
        + max_points::<ChargingFrequency>()
        + max_points::<ChargerType>()
        + max_points::<PropertyType>()
}

pub fn score_quiz(answers: &QuizAnswers) -> QuizScore {
    let score = answer_weights(answers).iter().map(|w| w.points).sum();
    QuizScore {
        score,
        tier: Tier::from_score(score),
    }
}

/// Dollar estimate: base cost plus per-answer surcharges, rounded to the
/// nearest $50 (halves round up) and clamped to the quoted range.
pub fn estimate_installation_cost(answers: &QuizAnswers) -> u32 {
    let raw = BASE_INSTALLATION_COST
        + answer_weights(answers)
            .iter()
            .map(|w| w.dollars)
            .sum::<u32>();
    let rounded = (raw + COST_ROUNDING_STEP / 2) / COST_ROUNDING_STEP * COST_ROUNDING_STEP;
    rounded.clamp(MIN_INSTALLATION_COST, MAX_INSTALLATION_COST)
}

pub fn percent_of_max(score: u32) -> u32 {
    let max = max_score();
    if max == 0 {
        return 0;
    }
    ((f64::from(score) / f64::from(max)) * 100.0).round() as u32
}

pub fn summarize(answers: &QuizAnswers) -> QuoteEstimate {
    let QuizScore { score, tier } = score_quiz(answers);
    QuoteEstimate {
        score,
        tier,
        percent: percent_of_max(score),
        installation_cost: estimate_installation_cost(answers),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Timeline;

    fn worst_case() -> QuizAnswers {
        QuizAnswers {
            electrical_system: Some(ElectricalSystem::ThirtyPlusOrUnsure),
            charging_frequency: Some(ChargingFrequency::CommercialFleet),
            charger_type: Some(ChargerType::Level3),
            property_type: Some(PropertyType::Commercial),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_answers() {
        let answers = QuizAnswers::default();
        assert_eq!(
            score_quiz(&answers),
            QuizScore {
                score: 0,
                tier: Tier::Simple
            }
        );
        assert_eq!(estimate_installation_cost(&answers), 800);
        assert_eq!(summarize(&answers).percent, 0);
    }

    #[test]
    fn test_max_score_is_derived_from_table() {
        assert_eq!(max_score(), 14);
    }

    #[test]
    fn test_worst_case_answers() {
        let estimate = summarize(&worst_case());
        assert_eq!(estimate.score, 14);
        assert_eq!(estimate.tier, Tier::Complex);
        assert_eq!(estimate.percent, 100);
        assert_eq!(estimate.installation_cost, 5700);
    }

    #[test]
    fn test_level2_only() {
        let answers = QuizAnswers {
            charger_type: Some(ChargerType::Level2),
            ..Default::default()
        };
        let estimate = summarize(&answers);
        assert_eq!(estimate.score, 2);
        assert_eq!(estimate.tier, Tier::Simple);
        assert_eq!(estimate.installation_cost, 1200);
        assert_eq!(estimate.percent, 14);
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(Tier::from_score(0), Tier::Simple);
        assert_eq!(Tier::from_score(3), Tier::Simple);
        assert_eq!(Tier::from_score(4), Tier::Standard);
        assert_eq!(Tier::from_score(7), Tier::Standard);
        assert_eq!(Tier::from_score(8), Tier::Complex);
        assert_eq!(Tier::from_score(14), Tier::Complex);
    }

    #[test]
    fn test_heavy_usage_buckets_share_surcharge() {
        let multiple = QuizAnswers {
            charging_frequency: Some(ChargingFrequency::MultipleTimesDaily),
            ..Default::default()
        };
        let fleet = QuizAnswers {
            charging_frequency: Some(ChargingFrequency::CommercialFleet),
            ..Default::default()
        };
        assert_eq!(estimate_installation_cost(&multiple), 1200);
        assert_eq!(estimate_installation_cost(&fleet), 1200);
        assert_ne!(score_quiz(&multiple).score, score_quiz(&fleet).score);
    }

    #[test]
    fn test_standard_tier_example() {
        // 20-30 years (2) + daily (2) + townhouse (1) = 5
        let answers = QuizAnswers {
            electrical_system: Some(ElectricalSystem::TwentyToThirtyYears),
            charging_frequency: Some(ChargingFrequency::DailyCommuting),
            property_type: Some(PropertyType::TownhouseCondo),
            timeline: Some(Timeline::Asap),
            ..Default::default()
        };
        let estimate = summarize(&answers);
        assert_eq!(estimate.score, 5);
        assert_eq!(estimate.tier, Tier::Standard);
        assert_eq!(estimate.installation_cost, 800 + 200 + 300);
    }

    #[test]
    fn test_tier_serializes_as_number() {
        assert_eq!(serde_json::to_value(Tier::Complex).unwrap(), 3);
        let tier: Tier = serde_json::from_value(serde_json::json!(2)).unwrap();
        assert_eq!(tier, Tier::Standard);
        assert!(serde_json::from_value::<Tier>(serde_json::json!(4)).is_err());
    }
}
