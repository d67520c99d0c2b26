/// Lead validation and CRM payload assembly
///
/// Takes the contact details from the lead form plus the frozen quiz answers
/// and turns them into what GoHighLevel receives:
/// 1. Validate email / phone / ZIP and require consent
/// 2. Split the name into first/last
/// 3. Build the contact custom fields (answers + score + estimate)
/// 4. Fingerprint the lead for duplicate-submission detection
use crate::errors::AppError;
use crate::ghl_models::{ContactRequest, OpportunityRequest};
use crate::models::{AnswerOption, LeadInfo, QuizAnswers};
use crate::scoring::QuoteEstimate;
use phonenumber::country::Id as CountryId;
use phonenumber::Mode;
use regex::Regex;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

pub const OPPORTUNITY_SOURCE: &str = "EV Charger Quiz";

/// A lead whose contact details passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLead {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// E.164, e.g. `+12015550123`.
    pub phone: String,
    pub zip: Option<String>,
}

impl ValidatedLead {
    pub fn full_name(&self) -> String {
        if self.last_name.is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }
}

/// Validate email address
///
/// Checks for:
/// - Basic email format (contains @ and .)
/// - Fake/placeholder patterns (repeated digits like 9999, 1111)
/// - Minimum length requirements
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 5 || !email.contains('@') || !email.contains('.') {
        return false;
    }

    let fake_patterns = ["999999", "111111", "000000", "123456789"];

    for pattern in &fake_patterns {
        if email.contains(pattern) {
            tracing::warn!(
                "❌ Invalid email detected (fake pattern '{}'): {}",
                pattern,
                email
            );
            return false;
        }
    }

    // RFC 5322 simplified: local@domain.tld
    let matches = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
    .map(|re| re.is_match(email))
    .unwrap_or(false);

    if !matches {
        tracing::warn!("❌ Invalid email format: {}", email);
    }
    matches
}

/// Validate and normalize a US phone number
///
/// Parses with the US region, requires a valid North American number and
/// returns it in E.164 (`+12015550123`).
///
/// Returns: (is_valid, normalized_phone_or_error_msg)
pub fn validate_us_phone(raw: &str) -> (bool, String) {
    if raw.trim().is_empty() || raw.len() < 7 {
        return (false, "Phone too short".to_string());
    }

    match phonenumber::parse(Some(CountryId::US), raw) {
        Ok(number) => {
            let formatted = number.format().mode(Mode::E164).to_string();
            if phonenumber::is_valid(&number) && formatted.starts_with("+1") {
                tracing::debug!("✓ Valid US phone: {} → {}", raw, formatted);
                (true, formatted)
            } else {
                tracing::warn!("❌ Invalid US phone number: {}", raw);
                (false, "Invalid US phone number".to_string())
            }
        }
        Err(e) => {
            tracing::warn!("❌ Failed to parse US phone '{}': {:?}", raw, e);
            (false, format!("Parse error: {:?}", e))
        }
    }
}

/// Five-digit US ZIP code.
pub fn is_valid_zip(zip: &str) -> bool {
    zip.len() == 5 && zip.chars().all(|c| c.is_ascii_digit())
}

/// Splits "First Middle Last" into ("First", "Middle Last").
pub fn split_name(name: &str) -> (String, String) {
    let trimmed = name.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
        None => (trimmed.to_string(), String::new()),
    }
}

/// Validates the lead form. `fallback_zip` (the ZIP typed in the quiz) is used
/// when the form carries none.
pub fn validate_lead(lead: &LeadInfo, fallback_zip: &str) -> Result<ValidatedLead, AppError> {
    if !lead.consent {
        return Err(AppError::BadRequest(
            "Consent is required to submit a quote request".to_string(),
        ));
    }

    let (first_name, last_name) = split_name(&lead.name);
    if first_name.is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }

    let email = lead.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::BadRequest(format!(
            "Invalid email address: {}",
            lead.email
        )));
    }

    let (phone_ok, phone) = validate_us_phone(&lead.phone);
    if !phone_ok {
        return Err(AppError::BadRequest(format!(
            "Invalid phone number: {} ({})",
            lead.phone, phone
        )));
    }

    let zip = lead
        .zip
        .as_deref()
        .map(str::trim)
        .filter(|z| !z.is_empty())
        .or_else(|| Some(fallback_zip.trim()).filter(|z| !z.is_empty()))
        .map(str::to_string);
    if let Some(ref zip) = zip {
        if !is_valid_zip(zip) {
            return Err(AppError::BadRequest(format!("Invalid ZIP code: {}", zip)));
        }
    }

    Ok(ValidatedLead {
        first_name,
        last_name,
        email,
        phone,
        zip,
    })
}

/// Contact custom fields carrying the quiz answers and the estimate.
pub fn crm_custom_fields(
    answers: &QuizAnswers,
    estimate: &QuoteEstimate,
    zip: Option<&str>,
) -> BTreeMap<String, Value> {
    fn label<T: AnswerOption>(value: Option<T>) -> Value {
        json!(value.map(T::label).unwrap_or(""))
    }

    let mut fields = BTreeMap::new();
    fields.insert(
        "electrical_system".to_string(),
        label(answers.electrical_system),
    );
    fields.insert(
        "charging_frequency".to_string(),
        label(answers.charging_frequency),
    );
    fields.insert("charger_type".to_string(), label(answers.charger_type));
    fields.insert("property_type".to_string(), label(answers.property_type));
    fields.insert("timeline".to_string(), label(answers.timeline));
    fields.insert("garage_type".to_string(), json!(answers.garage_type));
    fields.insert("current_panel".to_string(), json!(answers.current_panel));
    if let Some(zip) = zip {
        fields.insert("postal_code".to_string(), json!(zip));
    }
    fields.insert("quiz_score".to_string(), json!(estimate.score));
    fields.insert("installation_tier".to_string(), json!(estimate.tier.level()));
    fields.insert(
        "estimated_cost".to_string(),
        json!(estimate.installation_cost),
    );
    fields
}

pub fn contact_request(
    lead: &ValidatedLead,
    answers: &QuizAnswers,
    estimate: &QuoteEstimate,
) -> ContactRequest {
    ContactRequest {
        first_name: lead.first_name.clone(),
        last_name: lead.last_name.clone(),
        email: Some(lead.email.clone()),
        phone: Some(lead.phone.clone()),
        custom_fields: crm_custom_fields(answers, estimate, lead.zip.as_deref()),
    }
}

pub fn opportunity_request(
    lead: &ValidatedLead,
    contact_id: &str,
    estimate: &QuoteEstimate,
) -> OpportunityRequest {
    OpportunityRequest {
        contact_id: contact_id.to_string(),
        title: format!("EV Charger Quote - {}", lead.full_name()),
        status: Some("open".to_string()),
        value: Some(f64::from(estimate.installation_cost)),
        source: Some(OPPORTUNITY_SOURCE.to_string()),
    }
}

/// SHA-256 over the normalized email and phone, hex encoded. Used as the key
/// of the recent-submission cache.
pub fn lead_fingerprint(lead: &ValidatedLead) -> String {
    let mut hasher = Sha256::new();
    hasher.update(lead.email.as_bytes());
    hasher.update(b"|");
    hasher.update(lead.phone.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChargerType;
    use crate::scoring::summarize;

    fn lead() -> LeadInfo {
        LeadInfo {
            name: "Jane Q Doe".to_string(),
            email: " Jane@Example.com ".to_string(),
            phone: "(201) 555-0123".to_string(),
            zip: None,
            consent: true,
        }
    }

    #[test]
    fn test_split_name() {
        assert_eq!(
            split_name("  Jane Q Doe "),
            ("Jane".to_string(), "Q Doe".to_string())
        );
        assert_eq!(split_name("Cher"), ("Cher".to_string(), String::new()));
        assert_eq!(split_name("   "), (String::new(), String::new()));
    }

    #[test]
    fn test_zip_validation() {
        assert!(is_valid_zip("43215"));
        assert!(!is_valid_zip("4321"));
        assert!(!is_valid_zip("4321a"));
    }

    #[test]
    fn test_validate_lead_normalizes() {
        let validated = validate_lead(&lead(), "43215").unwrap();
        assert_eq!(validated.first_name, "Jane");
        assert_eq!(validated.last_name, "Q Doe");
        assert_eq!(validated.email, "jane@example.com");
        assert_eq!(validated.phone, "+12015550123");
        assert_eq!(validated.zip.as_deref(), Some("43215"));
        assert_eq!(validated.full_name(), "Jane Q Doe");
    }

    #[test]
    fn test_form_zip_wins_over_quiz_zip() {
        let mut info = lead();
        info.zip = Some("10001".to_string());
        let validated = validate_lead(&info, "43215").unwrap();
        assert_eq!(validated.zip.as_deref(), Some("10001"));
    }

    #[test]
    fn test_validate_lead_rejections() {
        let mut no_consent = lead();
        no_consent.consent = false;
        assert!(matches!(
            validate_lead(&no_consent, ""),
            Err(AppError::BadRequest(_))
        ));

        let mut bad_email = lead();
        bad_email.email = "fake999999@example.com".to_string();
        assert!(validate_lead(&bad_email, "").is_err());

        let mut bad_phone = lead();
        bad_phone.phone = "123".to_string();
        assert!(validate_lead(&bad_phone, "").is_err());

        let mut bad_zip = lead();
        bad_zip.zip = Some("ABCDE".to_string());
        assert!(validate_lead(&bad_zip, "").is_err());
    }

    #[test]
    fn test_custom_fields_carry_estimate() {
        let answers = QuizAnswers {
            charger_type: Some(ChargerType::Level2),
            garage_type: "Garage".to_string(),
            ..Default::default()
        };
        let estimate = summarize(&answers);
        let fields = crm_custom_fields(&answers, &estimate, Some("43215"));

        assert_eq!(fields["charger_type"], "Level 2 (240V home charger)");
        assert_eq!(fields["property_type"], "");
        assert_eq!(fields["garage_type"], "Garage");
        assert_eq!(fields["postal_code"], "43215");
        assert_eq!(fields["quiz_score"], 2);
        assert_eq!(fields["installation_tier"], 1);
        assert_eq!(fields["estimated_cost"], 1200);
    }

    #[test]
    fn test_opportunity_request_uses_estimate() {
        let validated = validate_lead(&lead(), "").unwrap();
        let estimate = summarize(&QuizAnswers::default());
        let request = opportunity_request(&validated, "c-1", &estimate);

        assert_eq!(request.title, "EV Charger Quote - Jane Q Doe");
        assert_eq!(request.value, Some(800.0));
        assert_eq!(request.source.as_deref(), Some(OPPORTUNITY_SOURCE));
    }

    #[test]
    fn test_fingerprint_is_stable_and_distinct() {
        let a = validate_lead(&lead(), "").unwrap();
        let mut other = lead();
        other.email = "john@example.com".to_string();
        let b = validate_lead(&other, "").unwrap();

        assert_eq!(lead_fingerprint(&a), lead_fingerprint(&a));
        assert_eq!(lead_fingerprint(&a).len(), 64);
        assert_ne!(lead_fingerprint(&a), lead_fingerprint(&b));
    }
}
