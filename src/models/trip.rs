//! Trip analysis, itinerary, and budget models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::place::Venue;

/// One turn of the planning conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new<R: Into<String>, C: Into<String>>(role: R, content: C) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Trip preferences extracted from the conversation by the model.
///
/// The model is asked for strings but occasionally answers with bare
/// numbers; the numeric-ish fields accept both.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TripAnalysis {
    pub destination: String,
    #[serde(deserialize_with = "stringly")]
    pub duration: Option<String>,
    #[serde(deserialize_with = "stringly")]
    pub budget: Option<String>,
    pub travel_style: Option<String>,
    pub interests: Vec<String>,
    #[serde(deserialize_with = "stringly")]
    pub group_size: Option<String>,
    pub accommodation: Option<String>,
    pub activities: Vec<String>,
    pub travel_dates: Option<String>,
    pub special_requirements: Vec<String>,
    pub confidence: Option<String>,
}

impl TripAnalysis {
    /// Trip length in days, defaulting to a week when unparseable.
    #[must_use]
    pub fn duration_days(&self) -> u32 {
        parse_leading_u32(self.duration.as_deref()).unwrap_or(7)
    }

    /// Number of travelers, defaulting to a pair.
    #[must_use]
    pub fn group_size_count(&self) -> u32 {
        parse_leading_u32(self.group_size.as_deref()).unwrap_or(2)
    }

    /// Travel style, defaulting to mid-range.
    #[must_use]
    pub fn style(&self) -> &str {
        self.travel_style.as_deref().unwrap_or("mid-range")
    }
}

/// Accept a JSON string or number and keep it as a string.
fn stringly<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stringly {
        Text(String),
        Number(f64),
    }

    Ok(Option::<Stringly>::deserialize(deserializer)?.map(|v| match v {
        Stringly::Text(s) => s,
        Stringly::Number(n) => {
            if n.fract() == 0.0 {
                format!("{}", n as i64)
            } else {
                n.to_string()
            }
        }
    }))
}

/// Parse the first integer in free text, e.g. "10 days" or "2 people".
fn parse_leading_u32(raw: Option<&str>) -> Option<u32> {
    let raw = raw?;
    let digits: String = raw
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// One day of a parsed or synthesized itinerary
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct DayPlan {
    pub day: u32,
    pub date: String,
    pub title: String,
    pub location: String,
    pub description: String,
    pub activities: Vec<String>,
}

/// A recommended guide with their specialization
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Guide {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speciality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<super::place::Contact>,
}

/// One line of the budget breakdown
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BudgetLine {
    pub total: f64,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_night: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nights: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_person_per_day: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub people: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_day: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BudgetBreakdown {
    pub accommodation: BudgetLine,
    pub meals: BudgetLine,
    pub activities: BudgetLine,
    pub transportation: BudgetLine,
    pub guide: BudgetLine,
    pub permits: BudgetLine,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BudgetSummary {
    pub subtotal: f64,
    pub taxes: f64,
    pub total: f64,
    pub per_person: f64,
    pub currency: String,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Total shifted down/up for cheaper and pricier renditions of the same trip
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PriceRange {
    pub budget: f64,
    pub mid_range: f64,
    pub luxury: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Budget {
    pub breakdown: BudgetBreakdown,
    pub summary: BudgetSummary,
    pub price_range: PriceRange,
}

/// Venue and guide suggestions produced by the model
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LlmRecommendations {
    pub hotels: Vec<Venue>,
    pub restaurants: Vec<Venue>,
    pub activities: Vec<Venue>,
    pub agencies: Vec<Venue>,
    pub guides: Vec<Guide>,
}

/// The aggregated trip-planning answer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
    pub trip_analysis: TripAnalysis,
    /// Day-by-day plan; model output is kept as-is, so the shape is loose
    pub itinerary: serde_json::Value,
    pub budget: Budget,
    pub hotels: Vec<Venue>,
    pub restaurants: Vec<Venue>,
    pub activities: Vec<Venue>,
    pub agencies: Vec<Venue>,
    pub guides: Vec<Guide>,
    pub last_updated: DateTime<Utc>,
    pub data_confidence: String,
}
