//! Domain models shared across the service

pub mod place;
pub mod trip;

pub use place::{Contact, Geocoded, Geometry, LatLng, LocationData, PlaceReview, Venue};
pub use trip::{
    Budget, BudgetBreakdown, BudgetLine, BudgetSummary, ChatMessage, DayPlan, Guide,
    LlmRecommendations, PriceRange, Recommendations, TripAnalysis,
};
