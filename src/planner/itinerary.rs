//! Free-text itinerary parsing
//!
//! Best-effort scan over model-written plan text looking for `Day N - Title`
//! lines. There is no grammar to lean on; unmatched lines feed the current
//! day's description and anything before the first day header is skipped.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::DayPlan;

static DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:#+\s*)?Day\s*(\d+)\s*[-:\u{2013}\u{2014}]\s*(.+)$").unwrap()
});

static TO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\bto\b|\u{2192}|arrive\s+(?:in|at))\s+([^,\-\u{2013}]+)").unwrap()
});

static ACTIVITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:Activity|Visit|Trek):\s*").unwrap());

/// Destinations that show up in plan titles; matched before any heuristics.
const KNOWN_PLACES: &[&str] = &[
    "Kathmandu",
    "Pokhara",
    "Lumbini",
    "Chitwan",
    "Nagarkot",
    "Bhaktapur",
    "Patan",
    "Bandipur",
    "Mustang",
    "Jomsom",
    "Gosaikunda",
    "Annapurna",
    "Everest",
    "Langtang",
    "Gorkha",
    "Manang",
    "Lukla",
    "Namche",
    "Dhulikhel",
];

/// Parse a free-form plan into day entries. Unparseable text yields an
/// empty vec.
#[must_use]
pub fn parse_plan_text(plan: &str) -> Vec<DayPlan> {
    let mut days: Vec<DayPlan> = Vec::new();

    for raw in plan.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(captures) = DAY_RE.captures(line) {
            let day = captures[1].parse().unwrap_or(0);
            let title = captures[2].trim().to_string();
            let location = extract_location(&title);
            days.push(DayPlan {
                day,
                date: format!("Day {day}"),
                title,
                location,
                description: String::new(),
                activities: Vec::new(),
            });
        } else if let Some(current) = days.last_mut() {
            if let Some(matched) = ACTIVITY_RE.find(line) {
                current.activities.push(line[matched.end()..].to_string());
            } else if current.description.is_empty() {
                current.description = line.to_string();
            } else {
                current.description.push(' ');
                current.description.push_str(line);
            }
        }
    }

    days
}

/// Pull the day's location out of its title: a known place name wins, then
/// the target of a "to X" / "arrive in X" phrase, then the title's first
/// segment.
fn extract_location(title: &str) -> String {
    let title_lower = title.to_lowercase();
    if let Some(place) = KNOWN_PLACES
        .iter()
        .find(|place| title_lower.contains(&place.to_lowercase()))
    {
        return (*place).to_string();
    }

    if let Some(captures) = TO_RE.captures(title) {
        let target = captures[1].trim();
        if !target.is_empty() {
            return target.to_string();
        }
    }

    let first_segment = title
        .split([',', '-', '\u{2013}'])
        .next()
        .unwrap_or("")
        .trim();
    if first_segment.is_empty() {
        "Nepal".to_string()
    } else {
        first_segment.to_string()
    }
}
