use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A closed set of quiz choices identified by the label shown to the user.
///
/// Labels are the wire format: the quiz front-end posts the exact option text
/// and the CRM custom fields receive it back unchanged.
pub trait AnswerOption: Copy + Sized + 'static {
    /// Every choice, in the order the quiz presents them.
    const ALL: &'static [Self];

    fn label(self) -> &'static str;

    /// Looks up a choice by its exact label. Anything else, including
    /// near-misses in case or whitespace, yields `None`.
    fn from_label(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|option| option.label() == raw)
    }
}

/// Age of the home's electrical system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElectricalSystem {
    UnderTenYears,
    TenToTwentyYears,
    TwentyToThirtyYears,
    ThirtyPlusOrUnsure,
}

impl AnswerOption for ElectricalSystem {
    const ALL: &'static [Self] = &[
        Self::UnderTenYears,
        Self::TenToTwentyYears,
        Self::TwentyToThirtyYears,
        Self::ThirtyPlusOrUnsure,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::UnderTenYears => "Less than 10 years",
            Self::TenToTwentyYears => "10-20 years",
            Self::TwentyToThirtyYears => "20-30 years",
            Self::ThirtyPlusOrUnsure => "30+ years / not sure",
        }
    }
}

/// How often the household expects to charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChargingFrequency {
    Planning,
    FewTimesAWeek,
    DailyCommuting,
    MultipleTimesDaily,
    CommercialFleet,
}

impl AnswerOption for ChargingFrequency {
    const ALL: &'static [Self] = &[
        Self::Planning,
        Self::FewTimesAWeek,
        Self::DailyCommuting,
        Self::MultipleTimesDaily,
        Self::CommercialFleet,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Planning => "Never (planning to buy EV)",
            Self::FewTimesAWeek => "A few times a week",
            Self::DailyCommuting => "Daily commuting",
            Self::MultipleTimesDaily => "Multiple times daily",
            Self::CommercialFleet => "Commercial/fleet use",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChargerType {
    Level1,
    Level2,
    Level3,
    Unsure,
}

impl AnswerOption for ChargerType {
    const ALL: &'static [Self] = &[Self::Level1, Self::Level2, Self::Level3, Self::Unsure];

    fn label(self) -> &'static str {
        match self {
            Self::Level1 => "Level 1 (120V outlet)",
            Self::Level2 => "Level 2 (240V home charger)",
            Self::Level3 => "Level 3 (DC fast charging)",
            Self::Unsure => "Not sure what I need",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    SingleFamily,
    TownhouseCondo,
    Apartment,
    Commercial,
}

impl AnswerOption for PropertyType {
    const ALL: &'static [Self] = &[
        Self::SingleFamily,
        Self::TownhouseCondo,
        Self::Apartment,
        Self::Commercial,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::SingleFamily => "Single family home",
            Self::TownhouseCondo => "Townhouse/Condo",
            Self::Apartment => "Apartment complex",
            Self::Commercial => "Commercial building",
        }
    }
}

/// Installation timeline. Collected for the CRM, never scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeline {
    Asap,
    OneToTwoWeeks,
    OneToTwoMonths,
    Exploring,
}

impl AnswerOption for Timeline {
    const ALL: &'static [Self] = &[
        Self::Asap,
        Self::OneToTwoWeeks,
        Self::OneToTwoMonths,
        Self::Exploring,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Asap => "ASAP",
            Self::OneToTwoWeeks => "1-2 weeks",
            Self::OneToTwoMonths => "1-2 months",
            Self::Exploring => "Exploring options",
        }
    }
}

/// Answers accumulated across the quiz steps.
///
/// Every field is optional. Missing, `null`, empty and unrecognized values all
/// deserialize to "unset", so a partial or malformed record is still a valid
/// input for scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswers {
    #[serde(default, deserialize_with = "lenient_option", serialize_with = "label_or_empty")]
    pub electrical_system: Option<ElectricalSystem>,

    #[serde(default, deserialize_with = "lenient_option", serialize_with = "label_or_empty")]
    pub charging_frequency: Option<ChargingFrequency>,

    #[serde(default, deserialize_with = "lenient_option", serialize_with = "label_or_empty")]
    pub charger_type: Option<ChargerType>,

    #[serde(default, deserialize_with = "lenient_option", serialize_with = "label_or_empty")]
    pub property_type: Option<PropertyType>,

    /// Where the charger should go (garage, driveway, carport...).
    #[serde(default, deserialize_with = "text_or_empty")]
    pub garage_type: String,

    #[serde(default, deserialize_with = "text_or_empty")]
    pub current_panel: String,

    #[serde(default, deserialize_with = "text_or_empty")]
    pub zip: String,

    #[serde(default, deserialize_with = "lenient_option", serialize_with = "label_or_empty")]
    pub timeline: Option<Timeline>,
}

/// Contact details captured by the lead form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub consent: bool,
}

fn lenient_option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: AnswerOption,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_str)
        .and_then(T::from_label))
}

fn label_or_empty<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: AnswerOption,
{
    serializer.serialize_str(value.map(T::label).unwrap_or(""))
}

fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}
