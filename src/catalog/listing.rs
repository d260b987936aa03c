//! List / Filter / Sort controllers
//!
//! Pure functions over fetched collections. Composition is always
//! filter-then-sort, which makes [`apply`] idempotent.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::city::City;

/// Category value meaning "no category filter"
pub const ALL_CATEGORIES: &str = "all";

/// Items that can be searched and grouped by category
pub trait Searchable {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn category(&self) -> &str;
}

/// Items that can be ordered by every [`SortKey`]
pub trait Rankable: Searchable {
    fn rank(&self) -> u32;
    fn rating(&self) -> f64;
    fn review_count(&self) -> u64;
}

impl Searchable for City {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn category(&self) -> &str {
        &self.category
    }
}

impl Rankable for City {
    fn rank(&self) -> u32 {
        self.rank
    }

    fn rating(&self) -> f64 {
        self.rating
    }

    fn review_count(&self) -> u64 {
        self.total_ratings
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl From<&str> for CategoryFilter {
    fn from(value: &str) -> Self {
        if value.is_empty() || value == ALL_CATEGORIES {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(value.to_string())
        }
    }
}

impl CategoryFilter {
    pub fn as_str(&self) -> &str {
        match self {
            CategoryFilter::All => ALL_CATEGORIES,
            CategoryFilter::Only(category) => category,
        }
    }
}

/// Search text plus category selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    pub search: String,
    pub category: CategoryFilter,
}

impl FilterQuery {
    pub fn new(search: impl Into<String>, category: impl Into<CategoryFilter>) -> Self {
        Self {
            search: search.into(),
            category: category.into(),
        }
    }

    /// Search only, every category
    pub fn search(text: impl Into<String>) -> Self {
        Self::new(text, CategoryFilter::All)
    }

    pub fn matches<T: Searchable + ?Sized>(&self, item: &T) -> bool {
        let term = self.search.trim().to_lowercase();
        let text_ok = term.is_empty()
            || item.name().to_lowercase().contains(&term)
            || item.description().to_lowercase().contains(&term)
            || item.category().to_lowercase().contains(&term);

        let category_ok = match &self.category {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => item.category() == category,
        };

        text_ok && category_ok
    }
}

/// Ordering options for ranked lists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortKey {
    /// Rank position, ascending
    #[default]
    Rank,
    /// Overall rating, descending
    Rating,
    /// Name, alphabetical
    Name,
    /// Number of ratings, descending
    Reviews,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [SortKey::Rank, SortKey::Rating, SortKey::Name, SortKey::Reviews];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Rank => "rank",
            SortKey::Rating => "rating",
            SortKey::Name => "name",
            SortKey::Reviews => "reviews",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Rank => "Rank",
            SortKey::Rating => "Rating",
            SortKey::Name => "Name",
            SortKey::Reviews => "Reviews",
        }
    }

    fn compare<T: Rankable>(&self, a: &T, b: &T) -> Ordering {
        match self {
            SortKey::Rank => a.rank().cmp(&b.rank()),
            SortKey::Rating => b.rating().total_cmp(&a.rating()),
            SortKey::Name => a.name().to_lowercase().cmp(&b.name().to_lowercase()),
            SortKey::Reviews => b.review_count().cmp(&a.review_count()),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rank" => Ok(SortKey::Rank),
            "rating" => Ok(SortKey::Rating),
            "name" => Ok(SortKey::Name),
            "reviews" | "review" | "ratings" => Ok(SortKey::Reviews),
            other => Err(format!("Unknown sort key: {}", other)),
        }
    }
}

/// Items matching `query`, in their original order
pub fn filter<T: Searchable + Clone>(items: &[T], query: &FilterQuery) -> Vec<T> {
    items
        .iter()
        .filter(|item| query.matches(*item))
        .cloned()
        .collect()
}

/// Stable in-place sort
pub fn sort<T: Rankable>(items: &mut [T], key: SortKey) {
    items.sort_by(|a, b| key.compare(a, b));
}

/// Filter, then sort
pub fn apply<T: Rankable + Clone>(items: &[T], query: &FilterQuery, key: SortKey) -> Vec<T> {
    let mut result = filter(items, query);
    sort(&mut result, key);
    result
}

/// `all` followed by each distinct category in first-seen order
pub fn categories<T: Searchable>(items: &[T]) -> Vec<String> {
    let mut result = vec![ALL_CATEGORIES.to_string()];
    for item in items {
        if !result.iter().any(|c| c == item.category()) {
            result.push(item.category().to_string());
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city(name: &str, rank: u32, rating: f64, reviews: u64, category: &str, description: &str) -> City {
        City {
            id: name.to_lowercase(),
            name: name.to_string(),
            slug: name.to_lowercase(),
            description: description.to_string(),
            category: category.to_string(),
            rating,
            rank,
            total_ratings: reviews,
            image: None,
        }
    }

    fn names(items: &[City]) -> Vec<&str> {
        items.iter().map(|c| c.name.as_str()).collect()
    }

    fn sample() -> Vec<City> {
        vec![
            city("Kandy", 2, 4.8, 120, "Heritage", "Hill capital around a lake"),
            city("Galle", 1, 4.2, 300, "Coastal", "Beach town with a Dutch fort"),
            city("ella", 0, 4.5, 40, "Nature", "Tea country village"),
            city("Mirissa", 3, 4.5, 90, "Coastal", "Whale watching and surf"),
        ]
    }

    #[test]
    fn test_rank_sort() {
        let mut items = vec![
            city("Kandy", 2, 0.0, 0, "", ""),
            city("Galle", 1, 0.0, 0, "", ""),
        ];
        sort(&mut items, SortKey::Rank);
        assert_eq!(names(&items), vec!["Galle", "Kandy"]);

        sort(&mut items, SortKey::Name);
        assert_eq!(names(&items), vec!["Galle", "Kandy"]);
    }

    #[test]
    fn test_rating_sort_descending() {
        let mut items = vec![
            city("Galle", 0, 4.2, 0, "", ""),
            city("Kandy", 0, 4.8, 0, "", ""),
        ];
        sort(&mut items, SortKey::Rating);
        assert_eq!(names(&items), vec!["Kandy", "Galle"]);
    }

    #[test]
    fn test_sorts_are_stable() {
        let mut items = sample();
        sort(&mut items, SortKey::Rating);
        // Ella and Mirissa tie on 4.5 and keep their input order
        assert_eq!(names(&items), vec!["Kandy", "ella", "Mirissa", "Galle"]);

        sort(&mut items, SortKey::Reviews);
        assert_eq!(names(&items), vec!["Galle", "Kandy", "Mirissa", "ella"]);
    }

    #[test]
    fn test_name_sort_ignores_case() {
        let mut items = sample();
        sort(&mut items, SortKey::Name);
        assert_eq!(names(&items), vec!["ella", "Galle", "Kandy", "Mirissa"]);
    }

    #[test]
    fn test_search_matches_description() {
        let found = filter(&sample(), &FilterQuery::search("beach"));
        assert_eq!(names(&found), vec!["Galle"]);

        let found = filter(&sample(), &FilterQuery::search("COASTAL"));
        assert_eq!(names(&found), vec!["Galle", "Mirissa"]);
    }

    #[test]
    fn test_category_filter_is_exact() {
        let query = FilterQuery::new("", "Coastal");
        assert_eq!(names(&filter(&sample(), &query)), vec!["Galle", "Mirissa"]);

        let query = FilterQuery::new("", "coastal");
        assert!(filter(&sample(), &query).is_empty());

        let query = FilterQuery::new("   ", ALL_CATEGORIES);
        assert_eq!(filter(&sample(), &query).len(), 4);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let query = FilterQuery::new("a", "Coastal");
        for key in SortKey::ALL {
            let once = apply(&sample(), &query, key);
            let twice = apply(&once, &query, key);
            assert_eq!(once, twice, "not idempotent for {}", key);
        }
    }

    #[test]
    fn test_categories_first_seen() {
        assert_eq!(
            categories(&sample()),
            vec!["all", "Heritage", "Coastal", "Nature"]
        );
        assert_eq!(categories::<City>(&[]), vec!["all"]);
    }

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!("Rating".parse::<SortKey>(), Ok(SortKey::Rating));
        assert_eq!("reviews".parse::<SortKey>(), Ok(SortKey::Reviews));
        assert!("stars".parse::<SortKey>().is_err());
        assert_eq!(SortKey::default(), SortKey::Rank);
    }
}
