//! Conversation analysis
//!
//! Extracts structured trip preferences from the planning conversation and
//! asks the model for venue/guide suggestions. Suggestion failures fall
//! back to a curated Nepal set so the pipeline always has agency and guide
//! data to merge.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::gemini::{self, TextModel};
use crate::models::{ChatMessage, Contact, Guide, LlmRecommendations, TripAnalysis, Venue};

pub struct Analyzer {
    model: Arc<dyn TextModel>,
}

impl Analyzer {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }

    /// Extract trip preferences from the conversation.
    pub async fn analyze(&self, conversation: &[ChatMessage]) -> Result<TripAnalysis> {
        let prompt = analysis_prompt(conversation)?;
        let (reply, model) = gemini::generate_with_fallback(self.model.as_ref(), &prompt).await?;

        let analysis: TripAnalysis = serde_json::from_str(&gemini::extract_json(&reply))
            .context("Trip analysis was not valid JSON")?;
        info!(
            destination = %analysis.destination,
            model,
            "Extracted trip analysis"
        );
        Ok(analysis)
    }

    /// Venue and guide suggestions for an analyzed trip. Never fails: model
    /// or parse trouble degrades to the curated fallback set.
    pub async fn recommendations_for(&self, analysis: &TripAnalysis) -> LlmRecommendations {
        match self.try_recommendations(analysis).await {
            Ok(recommendations) => recommendations,
            Err(e) => {
                warn!("Falling back to curated recommendations: {}", e);
                fallback_recommendations()
            }
        }
    }

    async fn try_recommendations(&self, analysis: &TripAnalysis) -> Result<LlmRecommendations> {
        let prompt = recommendations_prompt(analysis)?;
        let (reply, _) = gemini::generate_with_fallback(self.model.as_ref(), &prompt).await?;
        serde_json::from_str(&gemini::extract_json(&reply))
            .context("Recommendations were not valid JSON")
    }
}

fn analysis_prompt(conversation: &[ChatMessage]) -> Result<String> {
    let history = serde_json::to_string(conversation)?;
    Ok(format!(
        r#"Analyze this conversation history and extract detailed trip planning information:
{history}

Extract and return a JSON object with:
{{
  "destination": "specific location in Nepal",
  "duration": "number of days",
  "budget": "budget range in USD",
  "travelStyle": "luxury/mid-range/budget/backpacking",
  "interests": ["list of specific interests"],
  "groupSize": "number of people",
  "accommodation": "preferred type",
  "activities": ["specific activities mentioned"],
  "travelDates": "when they want to travel",
  "specialRequirements": ["any special needs"],
  "confidence": "high/medium/low based on information completeness"
}}

Return only the JSON object."#
    ))
}

fn recommendations_prompt(analysis: &TripAnalysis) -> Result<String> {
    let details = serde_json::to_string(analysis)?;
    Ok(format!(
        r#"You are planning a trip with these details: {details}

Recommend real, well-reviewed options for this trip. Return a JSON object with:
{{
  "hotels": [{{"name": "...", "rating": 4.5, "vicinity": "..."}}],
  "restaurants": [{{"name": "...", "rating": 4.5, "vicinity": "..."}}],
  "activities": [{{"name": "...", "vicinity": "..."}}],
  "agencies": [{{"name": "...", "speciality": "...", "contact": {{"phone": "..."}}}}],
  "guides": [{{"name": "...", "speciality": "...", "experience": "..."}}]
}}

Give up to 5 hotels, 5 restaurants, 5 activities, 3 agencies and 3 guides.
Return only the JSON object."#
    ))
}

/// Curated Nepal recommendations used when the model cannot produce a
/// parseable suggestion set.
fn fallback_recommendations() -> LlmRecommendations {
    let venue = |name: &str, rating: f64, speciality: Option<&str>| Venue {
        name: name.to_string(),
        rating: Some(rating),
        speciality: speciality.map(String::from),
        ..Default::default()
    };

    LlmRecommendations {
        hotels: Vec::new(),
        restaurants: vec![
            venue("Dal Bhat House", 4.5, Some("Nepali")),
            venue("Himalayan Kitchen", 4.3, Some("Local")),
            venue("Mountain View Restaurant", 4.2, Some("International")),
        ],
        activities: Vec::new(),
        agencies: vec![
            Venue {
                name: "Nepal Adventure Tours".to_string(),
                speciality: Some("Trekking".to_string()),
                contact: Some(Contact {
                    phone: "+977-1-4444444".to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            },
            Venue {
                name: "Himalayan Expeditions".to_string(),
                speciality: Some("Mountain Tours".to_string()),
                contact: Some(Contact {
                    phone: "+977-1-5555555".to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            },
        ],
        guides: vec![
            Guide {
                name: "Pemba Sherpa".to_string(),
                speciality: Some("Everest Region".to_string()),
                experience: Some("15 years".to_string()),
                contact: None,
            },
            Guide {
                name: "Ang Dorje".to_string(),
                speciality: Some("Annapurna Circuit".to_string()),
                experience: Some("12 years".to_string()),
                contact: None,
            },
        ],
    }
}
