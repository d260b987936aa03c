//! City Catalog
//!
//! City records as the backend returns them, and the list controllers the
//! rankings page runs over them.

mod city;
pub mod listing;

pub use city::{CategoryValues, City, CityDetail, ScoreLine};
pub use listing::{
    apply, categories, filter, sort, CategoryFilter, FilterQuery, Rankable, Searchable, SortKey,
    ALL_CATEGORIES,
};
