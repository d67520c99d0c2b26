//! Presentation of an estimate: currency text, tier copy and the
//! downloadable HTML quote.

use chrono::Utc;
use html_escape::encode_text;
use serde::Serialize;
use serde_json::json;

use crate::models::{AnswerOption, LeadInfo, QuizAnswers};
use crate::scoring::{summarize, QuoteEstimate, Tier};

pub const REPORT_FILENAME: &str = "ev-charger-quote.html";

/// Results page payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummary {
    pub score: u32,
    pub tier: Tier,
    pub tier_name: &'static str,
    pub tier_description: &'static str,
    pub percent: u32,
    pub installation_cost: u32,
    pub formatted_cost: String,
    pub recommendation: String,
}

impl QuoteSummary {
    pub fn new(answers: &QuizAnswers, estimate: QuoteEstimate) -> Self {
        Self {
            score: estimate.score,
            tier: estimate.tier,
            tier_name: estimate.tier.name(),
            tier_description: tier_description(estimate.tier),
            percent: estimate.percent,
            installation_cost: estimate.installation_cost,
            formatted_cost: format_usd(estimate.installation_cost),
            recommendation: recommendation(answers),
        }
    }

    pub fn from_answers(answers: &QuizAnswers) -> Self {
        Self::new(answers, summarize(answers))
    }
}

pub fn tier_description(tier: Tier) -> &'static str {
    match tier {
        Tier::Complex => {
            "Complex Installation - May require panel upgrade or additional electrical work"
        }
        Tier::Standard => {
            "Standard Installation - Straightforward setup with your current electrical system"
        }
        Tier::Simple => "Simple Installation - Basic setup with minimal electrical modifications",
    }
}

/// Whole dollars with thousands separators: `5700` -> `$5,700`.
pub fn format_usd(amount: u32) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("${}", grouped)
}

fn recommendation(answers: &QuizAnswers) -> String {
    let property = answers
        .property_type
        .map(|p| p.label().to_lowercase())
        .unwrap_or_else(|| "property".to_string());
    let charger = answers
        .charger_type
        .map(|c| c.label().to_string())
        .unwrap_or_else(|| "charging needs".to_string());
    format!(
        "Based on your {} and {}, we recommend a professional installation.",
        property, charger
    )
}

/// Standalone HTML page the visitor can save for their records.
pub fn render_report_html(answers: &QuizAnswers, lead: Option<&LeadInfo>) -> String {
    let summary = QuoteSummary::from_answers(answers);
    let details = serde_json::to_string_pretty(&json!({
        "answers": answers,
        "lead": lead,
    }))
    .unwrap_or_default();

    format!(
        "<!doctype html><html><head><meta charset='utf-8'>\
         <title>EV Charger Installation Quote</title></head><body>\
         <h1>EV Charger Installation Quote</h1>\
         <p>Personalized quote and recommendations based on your assessment. Save for your records.</p>\
         <p>Prepared {date}</p>\
         <h2>Estimated Cost: {cost}</h2>\
         <p>Installation tier: {tier}</p>\
         <p>{recommendation}</p>\
         <p><small>Quote is an estimate based on typical installations. \
         Final cost determined after site inspection by licensed electrician.</small></p>\
         <pre>{details}</pre></body></html>",
        date = Utc::now().format("%B %-d, %Y"),
        cost = encode_text(&summary.formatted_cost),
        tier = encode_text(summary.tier_description),
        recommendation = encode_text(&summary.recommendation),
        details = encode_text(&details),
    )
}
