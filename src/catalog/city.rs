//! City records
//!
//! The backend has renamed most city fields at least once, so both records
//! deserialize through a permissive raw shape that accepts every known alias.

use serde::Deserialize;

use crate::ids::optional_flexible_id;
use crate::rating::RatingCategory;

/// A ranked city as listed on the rankings page
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawCity")]
pub struct City {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub category: String,
    /// Overall rating, 0.0 when unrated
    pub rating: f64,
    /// Rank position, 0 when not ranked yet
    pub rank: u32,
    pub total_ratings: u64,
    /// Cover image, `None` when the city has no pictures
    pub image: Option<String>,
}

impl City {
    /// "Rank 3", or "New" for unranked cities
    pub fn rank_label(&self) -> String {
        if self.rank > 0 {
            format!("Rank {}", self.rank)
        } else {
            "New".to_string()
        }
    }

    /// Rating with one decimal
    pub fn rating_label(&self) -> String {
        format!("{:.1}", self.rating)
    }
}

/// Full city record for the detail page
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawCity")]
pub struct CityDetail {
    pub city: City,
    pub images: Vec<String>,
    pub amenities: Vec<String>,
    pub population: u64,
    pub temperature: f64,
    pub internet_speed: f64,
    /// Raw per-category values stored on the city itself
    pub scores: CategoryValues,
    /// Community averages per category
    pub averages: CategoryValues,
}

/// One value per rating category
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryValues {
    pub cost_of_living: Option<f64>,
    pub safety: Option<f64>,
    pub transportation: Option<f64>,
    pub healthcare: Option<f64>,
    pub food: Option<f64>,
    pub nightlife: Option<f64>,
    pub culture: Option<f64>,
    pub outdoor_activities: Option<f64>,
}

impl CategoryValues {
    pub fn get(&self, category: RatingCategory) -> Option<f64> {
        let value = match category {
            RatingCategory::CostOfLiving => self.cost_of_living,
            RatingCategory::Safety => self.safety,
            RatingCategory::Transportation => self.transportation,
            RatingCategory::Healthcare => self.healthcare,
            RatingCategory::Food => self.food,
            RatingCategory::Nightlife => self.nightlife,
            RatingCategory::Culture => self.culture,
            RatingCategory::OutdoorActivities => self.outdoor_activities,
        };
        // Zero means "not recorded" for every category
        value.filter(|v| *v != 0.0 && v.is_finite())
    }
}

/// A row in the detail page's score grid
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreLine {
    pub category: RatingCategory,
    pub value: String,
}

impl CityDetail {
    /// Score grid: community average when present, else the stored value
    pub fn score_lines(&self) -> Vec<ScoreLine> {
        RatingCategory::ALL
            .iter()
            .map(|&category| {
                let value = match (self.averages.get(category), self.scores.get(category)) {
                    (Some(avg), _) => format!("{:.1}/5", avg),
                    (None, Some(raw)) if category == RatingCategory::CostOfLiving => {
                        format!("${}/mo", trim_float(raw))
                    }
                    (None, Some(raw)) => trim_float(raw),
                    (None, None) => "N/A".to_string(),
                };
                ScoreLine { category, value }
            })
            .collect()
    }

    /// "#3", or "N/A" for unranked cities
    pub fn rank_label(&self) -> String {
        if self.city.rank > 0 {
            format!("#{}", self.city.rank)
        } else {
            "N/A".to_string()
        }
    }
}

fn trim_float(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBreakdown {
    cost_of_living_avg: Option<f64>,
    safety_avg: Option<f64>,
    transportation_avg: Option<f64>,
    healthcare_avg: Option<f64>,
    food_avg: Option<f64>,
    nightlife_avg: Option<f64>,
    culture_avg: Option<f64>,
    outdoor_activities_avg: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCity {
    #[serde(default, deserialize_with = "optional_flexible_id")]
    city_id: Option<String>,
    #[serde(default, rename = "city_id", deserialize_with = "optional_flexible_id")]
    city_id_snake: Option<String>,
    #[serde(default, deserialize_with = "optional_flexible_id")]
    id: Option<String>,

    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    category: Option<String>,

    #[serde(default)]
    overall_rating: Option<f64>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    rank_position: Option<i64>,
    #[serde(default)]
    rank: Option<i64>,
    #[serde(default)]
    total_ratings: Option<u64>,

    #[serde(default)]
    first_image_url: Option<String>,
    #[serde(default)]
    image_urls: Option<Vec<String>>,
    #[serde(default)]
    image: Option<String>,

    #[serde(default)]
    amenities: Option<serde_json::Value>,
    #[serde(default)]
    population: Option<f64>,
    #[serde(default)]
    temperature: Option<f64>,
    #[serde(default)]
    internet_speed: Option<f64>,
    #[serde(default)]
    ratings_breakdown: Option<RawBreakdown>,

    #[serde(default)]
    cost_of_living: Option<f64>,
    #[serde(default)]
    safety: Option<f64>,
    #[serde(default)]
    transportation: Option<f64>,
    #[serde(default)]
    healthcare: Option<f64>,
    #[serde(default)]
    food: Option<f64>,
    #[serde(default)]
    nightlife: Option<f64>,
    #[serde(default)]
    culture: Option<f64>,
    #[serde(default)]
    outdoor_activities: Option<f64>,
}

fn first_present(candidates: impl IntoIterator<Item = Option<String>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
}

impl From<RawCity> for City {
    fn from(raw: RawCity) -> Self {
        let first_listed = raw.image_urls.as_ref().and_then(|urls| urls.first().cloned());
        City {
            id: first_present([raw.city_id, raw.city_id_snake, raw.id]).unwrap_or_default(),
            name: raw.name.unwrap_or_default(),
            slug: raw.slug.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            category: first_present([raw.category]).unwrap_or_else(|| "Unknown".to_string()),
            rating: raw.overall_rating.or(raw.rating).unwrap_or(0.0),
            rank: raw
                .rank_position
                .or(raw.rank)
                .unwrap_or(0)
                .clamp(0, u32::MAX as i64) as u32,
            total_ratings: raw.total_ratings.unwrap_or(0),
            image: first_present([raw.first_image_url, first_listed, raw.image]),
        }
    }
}

impl From<RawCity> for CityDetail {
    fn from(mut raw: RawCity) -> Self {
        let images = raw.image_urls.clone().unwrap_or_default();
        let amenities = raw.amenities.take().map(parse_amenities).unwrap_or_default();
        let averages = raw.ratings_breakdown.take().unwrap_or_default();
        let scores = CategoryValues {
            cost_of_living: raw.cost_of_living,
            safety: raw.safety,
            transportation: raw.transportation,
            healthcare: raw.healthcare,
            food: raw.food,
            nightlife: raw.nightlife,
            culture: raw.culture,
            outdoor_activities: raw.outdoor_activities,
        };
        let population = raw.population.unwrap_or(0.0).max(0.0) as u64;
        let temperature = raw.temperature.unwrap_or(0.0);
        let internet_speed = raw.internet_speed.unwrap_or(0.0);

        CityDetail {
            city: City::from(raw),
            images,
            amenities,
            population,
            temperature,
            internet_speed,
            scores,
            averages: CategoryValues {
                cost_of_living: averages.cost_of_living_avg,
                safety: averages.safety_avg,
                transportation: averages.transportation_avg,
                healthcare: averages.healthcare_avg,
                food: averages.food_avg,
                nightlife: averages.nightlife_avg,
                culture: averages.culture_avg,
                outdoor_activities: averages.outdoor_activities_avg,
            },
        }
    }
}

/// Amenities arrive as a list, a JSON-encoded list, or a comma-separated string
fn parse_amenities(value: serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        serde_json::Value::String(text) => {
            if let Ok(list) = serde_json::from_str::<Vec<String>>(&text) {
                return list;
            }
            let text = text.trim();
            if text.is_empty() {
                Vec::new()
            } else if text.contains(',') {
                text.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            } else {
                vec![text.to_string()]
            }
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_field_aliases() {
        let city: City = serde_json::from_str(
            r#"{"city_id": 7, "name": "Kandy", "slug": "kandy", "rating": 4.1,
                "rank": 2, "imageUrls": ["a.jpg", "b.jpg"]}"#,
        )
        .unwrap();

        assert_eq!(city.id, "7");
        assert_eq!(city.rating, 4.1);
        assert_eq!(city.rank, 2);
        assert_eq!(city.image.as_deref(), Some("a.jpg"));
        assert_eq!(city.category, "Unknown");
        assert_eq!(city.total_ratings, 0);
    }

    #[test]
    fn test_preferred_fields_win() {
        let city: City = serde_json::from_str(
            r#"{"cityId": "c-1", "id": "ignored", "name": "Galle",
                "overallRating": 4.6, "rating": 1.0, "rankPosition": 1, "rank": 9,
                "firstImageUrl": "cover.jpg", "imageUrls": ["a.jpg"], "category": "Beach"}"#,
        )
        .unwrap();

        assert_eq!(city.id, "c-1");
        assert_eq!(city.rating, 4.6);
        assert_eq!(city.rank, 1);
        assert_eq!(city.image.as_deref(), Some("cover.jpg"));
        assert_eq!(city.category, "Beach");
    }

    #[test]
    fn test_rank_labels() {
        let mut city: City = serde_json::from_str(r#"{"name": "Ella"}"#).unwrap();
        assert_eq!(city.rank_label(), "New");
        city.rank = 4;
        assert_eq!(city.rank_label(), "Rank 4");
        assert_eq!(city.rating_label(), "0.0");
    }

    #[test]
    fn test_detail_record() {
        let detail: CityDetail = serde_json::from_str(
            r#"{"cityId": 3, "name": "Colombo", "population": 752993, "temperature": 28.5,
                "amenities": "[\"Beach\", \"Malls\"]", "costOfLiving": 850,
                "safety": 4, "ratingsBreakdown": {"safetyAvg": 4.26}, "internetSpeed": 45}"#,
        )
        .unwrap();

        assert_eq!(detail.city.id, "3");
        assert_eq!(detail.population, 752_993);
        assert_eq!(detail.amenities, vec!["Beach", "Malls"]);
        assert_eq!(detail.internet_speed, 45.0);
        assert_eq!(detail.rank_label(), "N/A");

        let lines = detail.score_lines();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0].value, "$850/mo");
        assert_eq!(lines[1].value, "4.3/5");
        assert_eq!(lines[2].value, "N/A");
    }

    #[test]
    fn test_amenity_shapes() {
        use serde_json::json;
        assert_eq!(parse_amenities(json!(["Wifi", 3, "Parks"])), vec!["Wifi", "Parks"]);
        assert_eq!(parse_amenities(json!("Wifi, Parks ,")), vec!["Wifi", "Parks"]);
        assert_eq!(parse_amenities(json!("Wifi")), vec!["Wifi"]);
        assert!(parse_amenities(json!(42)).is_empty());
        assert!(parse_amenities(json!("  ")).is_empty());
    }
}
