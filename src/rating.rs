//! City Ratings
//!
//! Staging for the rating form: eight categories scored 1 to 5, optional
//! review text, and the payload the ratings endpoint accepts. Scores are
//! validated where they are created, so a [`RatingPayload`] always carries
//! integers in range.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from staging a rating
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RatingError {
    #[error("Score must be between 1 and 5, got {0}")]
    OutOfRange(i64),

    #[error("Unknown rating category: {0}")]
    UnknownCategory(String),

    #[error("No city selected")]
    MissingCity,
}

/// Rated aspects of a city
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RatingCategory {
    CostOfLiving,
    Safety,
    Transportation,
    Healthcare,
    Food,
    Nightlife,
    Culture,
    OutdoorActivities,
}

impl RatingCategory {
    pub const ALL: [RatingCategory; 8] = [
        RatingCategory::CostOfLiving,
        RatingCategory::Safety,
        RatingCategory::Transportation,
        RatingCategory::Healthcare,
        RatingCategory::Food,
        RatingCategory::Nightlife,
        RatingCategory::Culture,
        RatingCategory::OutdoorActivities,
    ];

    /// Backend field name
    pub fn id(&self) -> &'static str {
        match self {
            RatingCategory::CostOfLiving => "costOfLiving",
            RatingCategory::Safety => "safety",
            RatingCategory::Transportation => "transportation",
            RatingCategory::Healthcare => "healthcare",
            RatingCategory::Food => "food",
            RatingCategory::Nightlife => "nightlife",
            RatingCategory::Culture => "culture",
            RatingCategory::OutdoorActivities => "outdoorActivities",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RatingCategory::CostOfLiving => "Cost of Living",
            RatingCategory::Safety => "Safety",
            RatingCategory::Transportation => "Transportation",
            RatingCategory::Healthcare => "Healthcare",
            RatingCategory::Food => "Food Quality",
            RatingCategory::Nightlife => "Nightlife",
            RatingCategory::Culture => "Culture",
            RatingCategory::OutdoorActivities => "Outdoor Activities",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RatingCategory::CostOfLiving => "Overall affordability",
            RatingCategory::Safety => "General security",
            RatingCategory::Transportation => "Public transport quality",
            RatingCategory::Healthcare => "Medical care quality",
            RatingCategory::Food => "Local cuisine and food safety",
            RatingCategory::Nightlife => "Night entertainment options",
            RatingCategory::Culture => "Cultural attractions and events",
            RatingCategory::OutdoorActivities => "Parks, hiking, outdoor fun",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            RatingCategory::CostOfLiving => "💰",
            RatingCategory::Safety => "🛡️",
            RatingCategory::Transportation => "🚗",
            RatingCategory::Healthcare => "🏥",
            RatingCategory::Food => "🍽️",
            RatingCategory::Nightlife => "🍸",
            RatingCategory::Culture => "🎭",
            RatingCategory::OutdoorActivities => "🌳",
        }
    }

    /// Parse a backend field name
    pub fn from_id(id: &str) -> Result<Self, RatingError> {
        Self::ALL
            .into_iter()
            .find(|c| c.id().eq_ignore_ascii_case(id))
            .ok_or_else(|| RatingError::UnknownCategory(id.to_string()))
    }
}

impl fmt::Display for RatingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An integer score from 1 to 5
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Score(u8);

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Value used for categories the user did not touch
    pub const NEUTRAL: Score = Score(3);

    const LABELS: [&'static str; 5] = ["Bad", "Okay", "Good", "Great", "Amazing"];

    pub fn new(value: i64) -> Result<Self, RatingError> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Score(value as u8))
        } else {
            Err(RatingError::OutOfRange(value))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// "Bad" through "Amazing"
    pub fn label(&self) -> &'static str {
        Self::LABELS[(self.0 - Self::MIN) as usize]
    }

    /// All scores in ascending order, for rendering the picker
    pub fn all() -> impl Iterator<Item = Score> {
        (Self::MIN..=Self::MAX).map(Score)
    }
}

impl Default for Score {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl<'de> Deserialize<'de> for Score {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = i64::deserialize(deserializer)?;
        Score::new(value).map_err(serde::de::Error::custom)
    }
}

/// Body of `POST /api/cities/{cityId}/ratings`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingPayload {
    pub user_id: String,
    pub ratings: CategoryScores,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_text: Option<String>,
}

/// One score per category, all present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScores {
    pub cost_of_living: Score,
    pub safety: Score,
    pub transportation: Score,
    pub healthcare: Score,
    pub food: Score,
    pub nightlife: Score,
    pub culture: Score,
    pub outdoor_activities: Score,
}

/// The rating form's in-progress state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingDraft {
    scores: BTreeMap<RatingCategory, Score>,
    review: String,
}

impl RatingDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, category: RatingCategory, score: Score) {
        self.scores.insert(category, score);
    }

    /// Stage a raw value, rejecting anything outside 1..=5
    pub fn set_value(&mut self, category: RatingCategory, value: i64) -> Result<(), RatingError> {
        self.set(category, Score::new(value)?);
        Ok(())
    }

    /// Score the user picked, if any
    pub fn get(&self, category: RatingCategory) -> Option<Score> {
        self.scores.get(&category).copied()
    }

    /// Picked score, or the neutral default
    pub fn effective(&self, category: RatingCategory) -> Score {
        self.get(category).unwrap_or_default()
    }

    pub fn set_review(&mut self, text: impl Into<String>) {
        self.review = text.into();
    }

    pub fn review(&self) -> &str {
        &self.review
    }

    /// Reset after a successful submission
    pub fn clear(&mut self) {
        self.scores.clear();
        self.review.clear();
    }

    /// Build the request body; untouched categories are neutral, a blank
    /// review is omitted
    pub fn to_payload(&self, user_id: impl Into<String>) -> RatingPayload {
        let review = self.review.trim();
        RatingPayload {
            user_id: user_id.into(),
            ratings: CategoryScores {
                cost_of_living: self.effective(RatingCategory::CostOfLiving),
                safety: self.effective(RatingCategory::Safety),
                transportation: self.effective(RatingCategory::Transportation),
                healthcare: self.effective(RatingCategory::Healthcare),
                food: self.effective(RatingCategory::Food),
                nightlife: self.effective(RatingCategory::Nightlife),
                culture: self.effective(RatingCategory::Culture),
                outdoor_activities: self.effective(RatingCategory::OutdoorActivities),
            },
            review_text: (!review.is_empty()).then(|| review.to_string()),
        }
    }

    /// Payload bound to its city; blocked when no city is selected
    pub fn prepare(
        &self,
        city_id: Option<&str>,
        user_id: impl Into<String>,
    ) -> Result<RatingSubmission, RatingError> {
        let city_id = city_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(RatingError::MissingCity)?;

        Ok(RatingSubmission {
            city_id: city_id.to_string(),
            payload: self.to_payload(user_id),
        })
    }
}

/// A rating ready to post
#[derive(Debug, Clone, PartialEq)]
pub struct RatingSubmission {
    pub city_id: String,
    pub payload: RatingPayload,
}
