//! Budget estimation
//!
//! Turns the trip analysis and live hotel data into a cost breakdown.
//! Prices are demo-grade USD estimates anchored on travel style.

use chrono::Utc;

use crate::models::{
    Budget, BudgetBreakdown, BudgetLine, BudgetSummary, PriceRange, TripAnalysis, Venue,
};

const GUIDE_DAILY_RATE: f64 = 50.0;
const BASE_ACTIVITY_COST: f64 = 25.0;
const MEALS_PER_DAY: f64 = 3.0;

/// Permit fees keyed by activity keywords. A trip always pays at least the
/// baseline fee.
const PERMIT_COSTS: &[(&str, f64)] = &[
    ("trekking", 50.0),
    ("everest", 500.0),
    ("annapurna", 100.0),
    ("national park", 30.0),
];
const MIN_PERMIT_COST: f64 = 50.0;

/// Estimate the full trip budget.
#[must_use]
pub fn calculate(analysis: &TripAnalysis, hotels: &[Venue]) -> Budget {
    let duration = analysis.duration_days();
    let group_size = analysis.group_size_count();
    let style = analysis.style();

    let per_night = average_hotel_price(hotels, style);
    let accommodation_total = per_night * f64::from(duration);

    let per_meal = meal_price(style);
    let meals_total = per_meal * MEALS_PER_DAY * f64::from(duration) * f64::from(group_size);

    let activities_total = activity_costs(&analysis.interests);
    let transportation_total = transport_daily_cost(style) * f64::from(duration);
    let guide_total = GUIDE_DAILY_RATE * f64::from(duration);
    let permits_total = permit_costs(&analysis.activities);

    let subtotal = accommodation_total
        + meals_total
        + activities_total
        + transportation_total
        + guide_total
        + permits_total;

    Budget {
        breakdown: BudgetBreakdown {
            accommodation: BudgetLine {
                total: accommodation_total,
                per_night: Some(per_night),
                nights: Some(duration),
                description: format!("{duration} nights accommodation"),
                ..Default::default()
            },
            meals: BudgetLine {
                total: meals_total,
                per_person_per_day: Some(per_meal * MEALS_PER_DAY),
                days: Some(duration),
                people: Some(group_size),
                description: format!("All meals for {group_size} people"),
                ..Default::default()
            },
            activities: BudgetLine {
                total: activities_total,
                description: "Tours, entrance fees, and activities".to_string(),
                ..Default::default()
            },
            transportation: BudgetLine {
                total: transportation_total,
                description: "Local and intercity transport".to_string(),
                ..Default::default()
            },
            guide: BudgetLine {
                total: guide_total,
                per_day: Some(GUIDE_DAILY_RATE),
                days: Some(duration),
                description: "Professional guide services".to_string(),
                ..Default::default()
            },
            permits: BudgetLine {
                total: permits_total,
                description: "Required permits and fees".to_string(),
                ..Default::default()
            },
        },
        summary: BudgetSummary {
            subtotal,
            // No significant tourist taxes in Nepal
            taxes: 0.0,
            total: subtotal,
            per_person: subtotal / f64::from(group_size),
            currency: "USD".to_string(),
            last_updated: Some(Utc::now()),
        },
        price_range: PriceRange {
            budget: (subtotal * 0.7).floor(),
            mid_range: subtotal,
            luxury: (subtotal * 1.8).floor(),
        },
    }
}

/// Nightly rate from live hotel price levels; style base price when no
/// hotels were found.
fn average_hotel_price(hotels: &[Venue], style: &str) -> f64 {
    if hotels.is_empty() {
        return match style {
            "budget" | "backpacking" => 20.0,
            "luxury" => 120.0,
            _ => 50.0,
        };
    }

    let prices: Vec<f64> = hotels
        .iter()
        .map(|hotel| match hotel.price_level {
            // Rough conversion from the API's 0-4 price level
            Some(level) => f64::from(level) * 25.0,
            None => 50.0,
        })
        .collect();

    prices.iter().sum::<f64>() / prices.len() as f64
}

fn meal_price(style: &str) -> f64 {
    match style {
        "budget" | "backpacking" => 8.0,
        "luxury" => 30.0,
        _ => 15.0,
    }
}

fn transport_daily_cost(style: &str) -> f64 {
    match style {
        "budget" | "backpacking" => 20.0,
        "luxury" => 80.0,
        _ => 40.0,
    }
}

fn activity_costs(interests: &[String]) -> f64 {
    let multiplier = if interests.is_empty() {
        3
    } else {
        interests.len()
    };
    BASE_ACTIVITY_COST * multiplier as f64
}

fn permit_costs(activities: &[String]) -> f64 {
    let mut total = 0.0;
    for activity in activities {
        let activity_lower = activity.to_lowercase();
        for (keyword, cost) in PERMIT_COSTS {
            if activity_lower.contains(keyword) {
                total += cost;
            }
        }
    }

    if total == 0.0 { MIN_PERMIT_COST } else { total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn analysis(style: &str, duration: &str, group: &str) -> TripAnalysis {
        TripAnalysis {
            destination: "Pokhara".to_string(),
            travel_style: Some(style.to_string()),
            duration: Some(duration.to_string()),
            group_size: Some(group.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_budget_arithmetic_mid_range() {
        let analysis = analysis("mid-range", "7", "2");
        let budget = calculate(&analysis, &[]);

        // 7 nights * 50 + 3 meals * 15 * 7 days * 2 people + 25 * 3
        // + 40 * 7 + 50 * 7 + 50 permits
        assert_eq!(budget.breakdown.accommodation.total, 350.0);
        assert_eq!(budget.breakdown.meals.total, 630.0);
        assert_eq!(budget.breakdown.activities.total, 75.0);
        assert_eq!(budget.breakdown.transportation.total, 280.0);
        assert_eq!(budget.breakdown.guide.total, 350.0);
        assert_eq!(budget.breakdown.permits.total, 50.0);
        assert_eq!(budget.summary.total, 1735.0);
        assert_eq!(budget.summary.per_person, 867.5);
        assert_eq!(budget.price_range.budget, (1735.0_f64 * 0.7).floor());
        assert_eq!(budget.price_range.luxury, (1735.0_f64 * 1.8).floor());
    }

    #[test]
    fn test_hotel_price_from_price_levels() {
        let hotels = vec![
            Venue {
                price_level: Some(2),
                ..Default::default()
            },
            Venue {
                price_level: Some(4),
                ..Default::default()
            },
            Venue::default(), // no price level, counted at 50
        ];
        // (50 + 100 + 50) / 3
        assert_eq!(average_hotel_price(&hotels, "mid-range"), 200.0 / 3.0);
    }

    #[rstest]
    #[case("budget", 20.0)]
    #[case("backpacking", 20.0)]
    #[case("mid-range", 50.0)]
    #[case("luxury", 120.0)]
    #[case("unheard-of", 50.0)]
    fn test_hotel_base_price_by_style(#[case] style: &str, #[case] expected: f64) {
        assert_eq!(average_hotel_price(&[], style), expected);
    }

    #[test]
    fn test_permit_keyword_table() {
        let activities = vec![
            "Everest base camp trekking".to_string(),
            "Chitwan national park safari".to_string(),
        ];
        // everest 500 + trekking 50 + national park 30
        assert_eq!(permit_costs(&activities), 580.0);
    }

    #[test]
    fn test_permit_minimum() {
        assert_eq!(permit_costs(&["museum visits".to_string()]), 50.0);
        assert_eq!(permit_costs(&[]), 50.0);
    }

    #[test]
    fn test_activity_costs_default_multiplier() {
        assert_eq!(activity_costs(&[]), 75.0);
        assert_eq!(activity_costs(&["yoga".to_string()]), 25.0);
    }
}
