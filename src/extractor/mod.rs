//! HTML extraction for search and detail pages

pub mod detail;
pub(crate) mod dom;
pub mod search_results;

pub use detail::{extract_details, extract_details_from_document};
pub use search_results::extract_search_results;
